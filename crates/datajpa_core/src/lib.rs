//! Data-access layer for members and teams over SQLite.
//! Repositories here are the only code that issues SQL.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod paging;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LoggingConfig, PagingConfig};
pub use db::{with_transaction, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget};
pub use model::{Member, MemberDto, MemberId, ModelError, Team, TeamId, TeamRef, MAX_AGE};
pub use paging::{MemberProperty, Page, PageRequest, Slice, Sort, SortDirection};
pub use repo::entity_graph::{EntityGraph, MemberAttribute};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::team_repo::{SqliteTeamRepository, TeamRepository};
pub use repo::{RepoError, RepoResult};
pub use service::member_service::MemberService;
pub use service::team_service::TeamService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Entity model for members and teams.
//!
//! # Responsibility
//! - Define entity shapes mapped to the `member` and `team` tables.
//! - Own field validation shared by every write path.
//!
//! # Invariants
//! - Identity is assigned by storage; a `None` id means transient.
//! - A member's team reference and the team's member list are changed
//!   together through `Member::change_team`.

pub mod dto;
pub mod member;
pub mod team;

pub use dto::MemberDto;
pub use member::{Member, MemberId, TeamRef, MAX_AGE};
pub use team::{Team, TeamId};

pub type ModelResult<T> = Result<T, ModelError>;

/// Validation and association errors raised before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("{entity} name must not be blank")]
    BlankName { entity: &'static str },
    #[error("member age {age} is outside 0..={max}")]
    AgeOutOfRange { age: i32, max: i32 },
    #[error("team `{team_name}` must be saved before members can join it")]
    TeamNotPersisted { team_name: String },
}

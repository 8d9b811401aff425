//! Command-line entry point for the member/team data-access layer.
//!
//! # Responsibility
//! - Load configuration, start logging and open the configured database.
//! - Expose seeding and a few read/bulk-update reports over the services.
//!
//! # Invariants
//! - Without a configured path the database is the `datajpa.db` file in the
//!   working directory, so data survives between runs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datajpa_core::db::open_db_with;
use datajpa_core::{
    init_logging, init_stderr_logging, AppConfig, DatabaseConfig, MemberService,
    SqliteMemberRepository, SqliteTeamRepository, TeamService,
};
use log::info;
use std::io::Write;
use std::path::PathBuf;

const DEFAULT_DATABASE_FILE: &str = "datajpa.db";

#[derive(Parser)]
#[command(name = "datajpa")]
#[command(about = "Member/team data-access demo", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "DATAJPA_CONFIG")]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory database instead of a file
    #[arg(long)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create teamA/teamB and a handful of members
    Seed,
    /// Print one page of members with the given age
    Members {
        #[arg(long, default_value_t = 25)]
        age: i32,
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// 0 selects the configured default size
        #[arg(long, default_value_t = 0)]
        size: u32,
    },
    /// Print member/team pairs
    Roster,
    /// Add a year to every member at least `from` years old
    BulkAge {
        #[arg(long)]
        from: i32,
    },
}

type Members<'conn> = MemberService<SqliteMemberRepository<'conn>>;
type Teams<'conn> = TeamService<SqliteTeamRepository<'conn>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let logging = match config.logging.dir.as_deref() {
        Some(dir) => init_logging(&config.logging.level, &dir.to_string_lossy()),
        None => init_stderr_logging(&config.logging.level),
    };
    logging
        .map_err(anyhow::Error::msg)
        .context("initializing logging")?;

    let database = database_config(&config.database, cli.in_memory);
    let conn = open_db_with(&database).context("opening database")?;
    let members = MemberService::with_paging(
        SqliteMemberRepository::try_new(&conn)?,
        config.paging.clone(),
    );
    let teams = TeamService::new(SqliteTeamRepository::try_new(&conn)?);

    execute(&cli.command, &members, &teams, &mut std::io::stdout().lock())
}

/// Picks the database the CLI opens: `--in-memory`, else the configured
/// path, else `datajpa.db` in the working directory.
fn database_config(configured: &DatabaseConfig, in_memory: bool) -> DatabaseConfig {
    let path = if in_memory {
        None
    } else {
        Some(
            configured
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
        )
    };
    DatabaseConfig {
        path,
        busy_timeout_ms: configured.busy_timeout_ms,
    }
}

fn execute<W: Write>(
    command: &Commands,
    members: &Members<'_>,
    teams: &Teams<'_>,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Seed => {
            let mut team_a = teams.create("teamA")?;
            let mut team_b = teams.create("teamB")?;
            for (idx, age) in [10, 20, 25, 25, 25, 37, 42].into_iter().enumerate() {
                let team = if idx % 2 == 0 { &mut team_a } else { &mut team_b };
                members.join(format!("member{}", idx + 1), age, Some(team))?;
            }
            info!("event=seed module=cli status=ok teams=2 members=7");
            writeln!(
                out,
                "seeded {} ({} members), {} ({} members)",
                team_a.name,
                team_a.members.len(),
                team_b.name,
                team_b.members.len()
            )?;
        }
        Commands::Members { age, page, size } => {
            let result = members.page_by_age(*age, *page, *size)?;
            for member in result.content() {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    member.id.unwrap_or_default(),
                    member.name,
                    member.age
                )?;
            }
            writeln!(
                out,
                "page {}/{} ({} total)",
                result.number() + 1,
                result.total_pages().max(1),
                result.total_elements()
            )?;
        }
        Commands::Roster => {
            for dto in members.roster()? {
                writeln!(out, "{}\t{}\t{}", dto.id, dto.name, dto.team_name)?;
            }
        }
        Commands::BulkAge { from } => {
            let changed = members.birthday_for_age_at_least(*from)?;
            writeln!(out, "updated {changed} members")?;
        }
    }
    Ok(())
}

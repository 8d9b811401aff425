//! Team repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `team` table.
//! - Load the inverse `members` collection from `member.team_id`.
//!
//! # Invariants
//! - Loaded teams list member ids in ascending order.
//! - Deleting a team that members still reference fails with the storage
//!   constraint error; members are never detached implicitly.

use crate::model::{MemberId, Team, TeamId};
use crate::repo::{count_to_u64, ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

/// Repository interface for team operations.
pub trait TeamRepository {
    /// Inserts a transient team (or updates a saved one) and returns its id.
    fn save(&self, team: &mut Team) -> RepoResult<TeamId>;
    fn update(&self, team: &Team) -> RepoResult<()>;
    fn delete(&self, id: TeamId) -> RepoResult<()>;
    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_all(&self) -> RepoResult<Vec<Team>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn save(&self, team: &mut Team) -> RepoResult<TeamId> {
        team.validate()?;

        if let Some(id) = team.id {
            self.update(team)?;
            return Ok(id);
        }

        self.conn
            .execute("INSERT INTO team (name) VALUES (?1);", [team.name.as_str()])?;
        let id = self.conn.last_insert_rowid();
        team.id = Some(id);
        debug!("event=team_save module=repo status=ok team_id={id}");
        Ok(id)
    }

    fn update(&self, team: &Team) -> RepoResult<()> {
        team.validate()?;
        let id = team.id.ok_or(RepoError::Transient { entity: "team" })?;

        let changed = self.conn.execute(
            "UPDATE team SET name = ?1 WHERE team_id = ?2;",
            params![team.name.as_str(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "team", id });
        }
        Ok(())
    }

    fn delete(&self, id: TeamId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM team WHERE team_id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "team", id });
        }
        Ok(())
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        load_team_by_id(self.conn, id)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut members_by_team: BTreeMap<TeamId, Vec<MemberId>> = BTreeMap::new();
        {
            let mut stmt = self.conn.prepare(
                "SELECT member_id, team_id
                 FROM member
                 WHERE team_id IS NOT NULL
                 ORDER BY member_id ASC;",
            )?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let member_id: MemberId = row.get(0)?;
                let team_id: TeamId = row.get(1)?;
                members_by_team.entry(team_id).or_default().push(member_id);
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT team_id, name FROM team ORDER BY team_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            let id: TeamId = row.get(0)?;
            teams.push(Team {
                id: Some(id),
                name: row.get(1)?,
                members: members_by_team.remove(&id).unwrap_or_default(),
            });
        }
        Ok(teams)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM team;", [], |row| row.get(0))?;
        count_to_u64(count)
    }
}

/// Loads one team with its member ids. Shared with lazy member loading.
pub(crate) fn load_team_by_id(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM team WHERE team_id = ?1;",
            [id],
            |row| row.get(0),
        )
        .optional()?;

    let Some(name) = name else {
        return Ok(None);
    };

    Ok(Some(Team {
        id: Some(id),
        name,
        members: load_member_ids(conn, id)?,
    }))
}

fn load_member_ids(conn: &Connection, team_id: TeamId) -> RepoResult<Vec<MemberId>> {
    let mut stmt = conn.prepare(
        "SELECT member_id FROM member WHERE team_id = ?1 ORDER BY member_id ASC;",
    )?;
    let mut rows = stmt.query([team_id])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

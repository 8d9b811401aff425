//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide common CRUD over the `member` table.
//! - Provide the finder, projection, paging and bulk-update queries.
//! - Choose between lazy team references and joined team fetches.
//!
//! # Invariants
//! - Lists are ordered by `member_id ASC` unless a query states otherwise.
//! - Lazy finders return `TeamRef::Id`; fetch joins and entity graphs
//!   return `TeamRef::Loaded` in a single statement.
//! - There is no cache: every read observes the latest committed writes,
//!   including bulk updates.

use crate::model::{Member, MemberDto, MemberId, Team, TeamId, TeamRef};
use crate::paging::{MemberProperty, Page, PageRequest, Slice, Sort, SortDirection};
use crate::repo::entity_graph::EntityGraph;
use crate::repo::team_repo::load_team_by_id;
use crate::repo::{count_to_u64, ensure_connection_ready, RepoError, RepoResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Params, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    m.member_id,
    m.name,
    m.age,
    m.team_id
FROM member m";

const MEMBER_WITH_TEAM_SELECT_SQL: &str = "SELECT
    m.member_id,
    m.name,
    m.age,
    m.team_id,
    t.name AS team_name,
    (SELECT group_concat(tm.member_id)
       FROM member tm
      WHERE tm.team_id = t.team_id) AS team_member_ids
FROM member m
LEFT JOIN team t ON t.team_id = m.team_id";

/// Repository interface for member operations.
pub trait MemberRepository {
    /// Inserts a transient member (or updates a saved one) and returns its id.
    fn save(&self, member: &mut Member) -> RepoResult<MemberId>;
    /// Associates `member` with `team`, saves it, and records the id on
    /// the team's collection.
    fn save_in_team(&self, member: &mut Member, team: &mut Team) -> RepoResult<MemberId>;
    fn update(&self, member: &Member) -> RepoResult<()>;
    fn delete(&self, id: MemberId) -> RepoResult<()>;
    /// Removes every member and returns the number of rows removed.
    fn delete_all(&self) -> RepoResult<usize>;
    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;
    /// Like `find_by_id`, but a miss is `RepoError::NotFound`.
    fn find(&self, id: MemberId) -> RepoResult<Member>;
    fn find_all(&self) -> RepoResult<Vec<Member>>;
    fn count(&self) -> RepoResult<u64>;

    fn find_by_name_and_age_greater_than(&self, name: &str, age: i32) -> RepoResult<Vec<Member>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Member>>;
    /// Members matching both `name` and `age` exactly.
    fn find_user(&self, name: &str, age: i32) -> RepoResult<Vec<Member>>;
    fn find_name_list(&self) -> RepoResult<Vec<String>>;
    /// Member/team projection; members without a team are left out.
    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>>;
    fn find_by_names(&self, names: &[&str]) -> RepoResult<Vec<Member>>;

    /// Manual paging: members of `age` ordered by name descending.
    fn find_by_page(&self, age: i32, offset: u64, limit: u32) -> RepoResult<Vec<Member>>;
    fn total_count(&self, age: i32) -> RepoResult<u64>;
    fn find_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>>;
    fn find_slice_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Slice<Member>>;

    /// Adds one year to every member aged `age` or older.
    ///
    /// The statement is rejected as a whole, changing no rows, when any
    /// member would pass `MAX_AGE`.
    fn bulk_age_plus(&self, age: i32) -> RepoResult<usize>;

    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>>;
    fn find_all_with_graph(&self, graph: &EntityGraph) -> RepoResult<Vec<Member>>;
    fn find_by_name_with_graph(&self, name: &str, graph: &EntityGraph)
        -> RepoResult<Vec<Member>>;
    /// Resolves a lazy team reference with one query and keeps the result
    /// on `member`.
    fn load_team<'m>(&self, member: &'m mut Member) -> RepoResult<Option<&'m Team>>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_members<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn query_members_with_team<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_with_team_row(row)?);
        }
        Ok(members)
    }

    fn query_age_window(
        &self,
        age: i32,
        request: &PageRequest,
        limit: u64,
    ) -> RepoResult<Vec<Member>> {
        let sql = format!(
            "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
            request.sort().to_order_by()
        );
        self.query_members(
            &sql,
            params![age, to_sql_int(limit)?, to_sql_int(request.offset())?],
        )
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn save(&self, member: &mut Member) -> RepoResult<MemberId> {
        member.validate()?;

        if let Some(id) = member.id {
            self.update(member)?;
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO member (name, age, team_id) VALUES (?1, ?2, ?3);",
            params![member.name.as_str(), member.age, member.team_id()],
        )?;
        let id = self.conn.last_insert_rowid();
        member.id = Some(id);
        debug!(
            "event=member_save module=repo status=ok member_id={} has_team={}",
            id,
            member.team.is_some()
        );
        Ok(id)
    }

    fn save_in_team(&self, member: &mut Member, team: &mut Team) -> RepoResult<MemberId> {
        member.change_team(team)?;
        let id = self.save(member)?;
        team.add_member(id);
        Ok(id)
    }

    fn update(&self, member: &Member) -> RepoResult<()> {
        member.validate()?;
        let id = member.id.ok_or(RepoError::Transient { entity: "member" })?;

        let changed = self.conn.execute(
            "UPDATE member
             SET
                name = ?1,
                age = ?2,
                team_id = ?3
             WHERE member_id = ?4;",
            params![member.name.as_str(), member.age, member.team_id(), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "member",
                id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: MemberId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM member WHERE member_id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "member",
                id,
            });
        }
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM member;", [])?)
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut members =
            self.query_members(&format!("{MEMBER_SELECT_SQL} WHERE m.member_id = ?1;"), [id])?;
        Ok(members.pop())
    }

    fn find(&self, id: MemberId) -> RepoResult<Member> {
        self.find_by_id(id)?.ok_or(RepoError::NotFound {
            entity: "member",
            id,
        })
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.query_members(
            &format!("{MEMBER_SELECT_SQL} ORDER BY m.member_id ASC;"),
            [],
        )
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM member;", [], |row| row.get(0))?;
        count_to_u64(count)
    }

    fn find_by_name_and_age_greater_than(&self, name: &str, age: i32) -> RepoResult<Vec<Member>> {
        self.query_members(
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.name = ?1 AND m.age > ?2 ORDER BY m.member_id ASC;"
            ),
            params![name, age],
        )
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Member>> {
        self.query_members(
            &format!("{MEMBER_SELECT_SQL} WHERE m.name = ?1 ORDER BY m.member_id ASC;"),
            [name],
        )
    }

    fn find_user(&self, name: &str, age: i32) -> RepoResult<Vec<Member>> {
        self.query_members(
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.name = ?1 AND m.age = ?2 ORDER BY m.member_id ASC;"
            ),
            params![name, age],
        )
    }

    fn find_name_list(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT m.name FROM member m ORDER BY m.member_id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.member_id, m.name, t.name
             FROM member m
             INNER JOIN team t ON t.team_id = m.team_id
             ORDER BY m.member_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut dtos = Vec::new();
        while let Some(row) = rows.next()? {
            dtos.push(MemberDto {
                id: row.get(0)?,
                name: row.get(1)?,
                team_name: row.get(2)?,
            });
        }
        Ok(dtos)
    }

    fn find_by_names(&self, names: &[&str]) -> RepoResult<Vec<Member>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "{MEMBER_SELECT_SQL} WHERE m.name IN ({placeholders}) ORDER BY m.member_id ASC;"
        );
        let bind_values: Vec<Value> = names
            .iter()
            .map(|name| Value::Text((*name).to_string()))
            .collect();
        self.query_members(&sql, params_from_iter(bind_values))
    }

    fn find_by_page(&self, age: i32, offset: u64, limit: u32) -> RepoResult<Vec<Member>> {
        let sql = format!(
            "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
            Sort::by(SortDirection::Desc, MemberProperty::Name).to_order_by()
        );
        self.query_members(
            &sql,
            params![age, i64::from(limit), to_sql_int(offset)?],
        )
    }

    fn total_count(&self, age: i32) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT count(*) FROM member m WHERE m.age = ?1;",
            [age],
            |row| row.get(0),
        )?;
        count_to_u64(count)
    }

    fn find_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>> {
        ensure_page_size(request)?;

        let content = self.query_age_window(age, request, u64::from(request.size()))?;
        let (total, count_query) = match known_total(request, content.len()) {
            Some(total) => (total, "skipped"),
            None => (self.total_count(age)?, "run"),
        };
        debug!(
            "event=page_query module=repo status=ok kind=page {} rows={} total={} count_query={}",
            request,
            content.len(),
            total,
            count_query
        );
        Ok(Page::new(content, request, total))
    }

    fn find_slice_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Slice<Member>> {
        ensure_page_size(request)?;

        let rows = self.query_age_window(age, request, u64::from(request.size()) + 1)?;
        let slice = Slice::from_lookahead(rows, request);
        debug!(
            "event=page_query module=repo status=ok kind=slice {} rows={} has_next={}",
            request,
            slice.content().len(),
            slice.has_next()
        );
        Ok(slice)
    }

    fn bulk_age_plus(&self, age: i32) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE member SET age = age + 1 WHERE age >= ?1;",
            [age],
        )?;
        info!("event=bulk_update module=repo status=ok from_age={age} rows={changed}");
        Ok(changed)
    }

    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>> {
        self.query_members_with_team(
            &format!("{MEMBER_WITH_TEAM_SELECT_SQL} ORDER BY m.member_id ASC;"),
            [],
        )
    }

    fn find_all_with_graph(&self, graph: &EntityGraph) -> RepoResult<Vec<Member>> {
        if graph.fetches_team() {
            self.find_member_fetch_join()
        } else {
            self.find_all()
        }
    }

    fn find_by_name_with_graph(
        &self,
        name: &str,
        graph: &EntityGraph,
    ) -> RepoResult<Vec<Member>> {
        if !graph.fetches_team() {
            return self.find_by_name(name);
        }
        self.query_members_with_team(
            &format!("{MEMBER_WITH_TEAM_SELECT_SQL} WHERE m.name = ?1 ORDER BY m.member_id ASC;"),
            [name],
        )
    }

    fn load_team<'m>(&self, member: &'m mut Member) -> RepoResult<Option<&'m Team>> {
        let pending = match member.team {
            None => return Ok(None),
            Some(TeamRef::Loaded(_)) => None,
            Some(TeamRef::Id(team_id)) => Some(team_id),
        };

        if let Some(team_id) = pending {
            debug!(
                "event=lazy_load module=repo status=start member_id={} team_id={}",
                member.id.unwrap_or_default(),
                team_id
            );
            let team = load_team_by_id(self.conn, team_id)?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "member.team_id `{team_id}` references a missing team"
                ))
            })?;
            member.team = Some(TeamRef::Loaded(Box::new(team)));
        }

        Ok(member.loaded_team())
    }
}

fn ensure_page_size(request: &PageRequest) -> RepoResult<()> {
    if request.size() == 0 {
        return Err(RepoError::InvalidPageRequest(
            "page size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Derives the total from the content window when it is unambiguous, so
/// the count query can be skipped.
fn known_total(request: &PageRequest, content_len: usize) -> Option<u64> {
    let len = content_len as u64;
    let size = u64::from(request.size());
    let offset = request.offset();

    if offset == 0 {
        return (len < size).then_some(len);
    }
    if len != 0 && len < size {
        return Some(offset + len);
    }
    None
}

fn to_sql_int(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidPageRequest(format!("value {value} exceeds sqlite range")))
}

/// Maps a stored row as-is. Field rules are write-side only; the schema
/// `CHECK`s keep stored values inside them.
fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    Ok(Member {
        id: Some(row.get("member_id")?),
        name: row.get("name")?,
        age: row.get("age")?,
        team: row.get::<_, Option<TeamId>>("team_id")?.map(TeamRef::Id),
    })
}

fn parse_member_with_team_row(row: &Row<'_>) -> RepoResult<Member> {
    let mut member = parse_member_row(row)?;

    if let Some(team_id) = member.team_id() {
        let team_name: Option<String> = row.get("team_name")?;
        let team_name = team_name.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "member.team_id `{team_id}` references a missing team"
            ))
        })?;
        let member_ids: Option<String> = row.get("team_member_ids")?;
        member.team = Some(TeamRef::Loaded(Box::new(Team {
            id: Some(team_id),
            name: team_name,
            members: parse_member_ids(member_ids.as_deref())?,
        })));
    }

    Ok(member)
}

fn parse_member_ids(value: Option<&str>) -> RepoResult<Vec<MemberId>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let mut ids = value
        .split(',')
        .map(|part| {
            part.trim().parse::<MemberId>().map_err(|_| {
                RepoError::InvalidData(format!("invalid member id `{part}` in team member list"))
            })
        })
        .collect::<RepoResult<Vec<_>>>()?;
    ids.sort_unstable();
    Ok(ids)
}

use datajpa_core::db::{open_db_in_memory, with_transaction};
use datajpa_core::{
    Member, MemberRepository, RepoError, RepoResult, SqliteMemberRepository,
    SqliteTeamRepository, Team, TeamRepository,
};
use rusqlite::Connection;

fn member_count(conn: &Connection) -> u64 {
    SqliteMemberRepository::try_new(conn)
        .unwrap()
        .count()
        .unwrap()
}

#[test]
fn committed_work_is_visible() {
    let mut conn = open_db_in_memory().unwrap();

    let id = with_transaction(&mut conn, |tx| -> RepoResult<_> {
        let teams = SqliteTeamRepository::try_new(tx)?;
        let members = SqliteMemberRepository::try_new(tx)?;
        let mut team = Team::new("teamA");
        teams.save(&mut team)?;
        members.save_in_team(&mut Member::with_age("member1", 10), &mut team)
    })
    .unwrap();

    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    assert_eq!(repo.find(id).unwrap().name, "member1");
}

#[test]
fn failed_work_is_rolled_back() {
    let mut conn = open_db_in_memory().unwrap();

    let result = with_transaction(&mut conn, |tx| -> RepoResult<()> {
        let members = SqliteMemberRepository::try_new(tx)?;
        members.save(&mut Member::with_age("member1", 10))?;
        members.save(&mut Member::with_age("member2", 10))?;
        Err(RepoError::NotFound {
            entity: "team",
            id: 42,
        })
    });

    assert!(matches!(result, Err(RepoError::NotFound { id: 42, .. })));
    assert_eq!(member_count(&conn), 0);
}

#[test]
fn work_error_survives_a_failed_rollback() {
    let mut conn = open_db_in_memory().unwrap();

    let result = with_transaction(&mut conn, |tx| -> RepoResult<()> {
        // Ends the transaction early so the scope's own rollback fails.
        tx.execute_batch("ROLLBACK;")?;
        Err(RepoError::NotFound {
            entity: "member",
            id: 7,
        })
    });

    assert!(matches!(
        result,
        Err(RepoError::NotFound {
            entity: "member",
            id: 7
        })
    ));
    assert!(conn.is_autocommit());
}

#[test]
fn constraint_failure_inside_transaction_discards_earlier_writes() {
    let mut conn = open_db_in_memory().unwrap();

    let err = with_transaction(&mut conn, |tx| -> RepoResult<()> {
        let members = SqliteMemberRepository::try_new(tx)?;
        members.save(&mut Member::with_age("member1", 10))?;
        let mut orphan = Member::with_age("orphan", 10);
        orphan.team = Some(datajpa_core::TeamRef::Id(404));
        members.save(&mut orphan)?;
        Ok(())
    })
    .unwrap_err();

    assert!(err.is_constraint_violation());
    assert_eq!(member_count(&conn), 0);
}

#[test]
fn dropped_transaction_rolls_back() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let tx = conn.transaction().unwrap();
        SqliteMemberRepository::try_new(&tx)
            .unwrap()
            .save(&mut Member::new("member1"))
            .unwrap();
    }
    assert_eq!(member_count(&conn), 0);
}

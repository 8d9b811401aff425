use datajpa_core::db::migrations::latest_version;
use datajpa_core::db::open_db_in_memory;
use datajpa_core::{
    Member, MemberRepository, ModelError, RepoError, SqliteMemberRepository, Team, TeamRef,
};
use rusqlite::Connection;

#[test]
fn saved_member_is_found_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("memberA");
    let id = repo.save(&mut member).unwrap();
    assert_eq!(member.id, Some(id));

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.id, member.id);
    assert_eq!(found.name, member.name);
    assert_eq!(found, member);
    assert_eq!(repo.find(id).unwrap(), member);
}

#[test]
fn basic_crud() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member1 = Member::new("member1");
    let mut member2 = Member::new("member2");
    let id1 = repo.save(&mut member1).unwrap();
    let id2 = repo.save(&mut member2).unwrap();

    assert_eq!(repo.find_by_id(id1).unwrap().unwrap(), member1);
    assert_eq!(repo.find_by_id(id2).unwrap().unwrap(), member2);

    let all = repo.find_all().unwrap();
    assert_eq!(all, vec![member1, member2]);
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(id1).unwrap();
    repo.delete(id2).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn missing_member_is_empty_optional_or_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    assert!(repo.find_by_id(42).unwrap().is_none());
    assert!(matches!(
        repo.find(42),
        Err(RepoError::NotFound {
            entity: "member",
            id: 42
        })
    ));
    assert!(matches!(
        repo.delete(42),
        Err(RepoError::NotFound { id: 42, .. })
    ));
}

#[test]
fn update_writes_changes_explicitly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("member1", 10);
    let id = repo.save(&mut member).unwrap();

    member.name = "renamed".to_string();
    assert_eq!(repo.find(id).unwrap().name, "member1");

    repo.update(&member).unwrap();
    assert_eq!(repo.find(id).unwrap().name, "renamed");

    member.age = 11;
    assert_eq!(repo.save(&mut member).unwrap(), id);
    assert_eq!(repo.find(id).unwrap().age, 11);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn update_rejects_transient_and_deleted_members() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let transient = Member::new("ghost");
    assert!(matches!(
        repo.update(&transient),
        Err(RepoError::Transient { entity: "member" })
    ));

    let mut member = Member::new("member1");
    let id = repo.save(&mut member).unwrap();
    repo.delete(id).unwrap();
    assert!(matches!(
        repo.update(&member),
        Err(RepoError::NotFound { id: missing, .. }) if missing == id
    ));
}

#[test]
fn validation_failure_blocks_save() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut blank = Member::new("   ");
    assert!(matches!(
        repo.save(&mut blank),
        Err(RepoError::Validation(ModelError::BlankName { .. }))
    ));
    assert!(blank.id.is_none());

    let mut negative = Member::with_age("member1", -3);
    assert!(matches!(
        repo.save(&mut negative),
        Err(RepoError::Validation(ModelError::AgeOutOfRange { .. }))
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn saving_member_with_unknown_team_violates_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("member1", 10);
    member.team = Some(TeamRef::Id(999));

    let err = repo.save(&mut member).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn member_with_unsaved_loaded_team_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    let mut member = Member::with_age("member1", 10);
    member.team = Some(TeamRef::Loaded(Box::new(Team::new("draft"))));

    assert!(matches!(
        repo.save(&mut member),
        Err(RepoError::Validation(ModelError::TeamNotPersisted { .. }))
    ));
    assert!(member.is_transient());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn delete_all_reports_removed_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    for name in ["a", "b", "c"] {
        repo.save(&mut Member::new(name)).unwrap();
    }

    assert_eq!(repo.delete_all().unwrap(), 3);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteMemberRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_member_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE team (team_id INTEGER PRIMARY KEY, name TEXT NOT NULL);")
        .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMemberRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("member"))
    ));
}

#[test]
fn repository_rejects_member_table_without_team_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE team (team_id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE member (
            member_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            age INTEGER NOT NULL
         );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteMemberRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "member",
            column: "team_id"
        })
    ));
}

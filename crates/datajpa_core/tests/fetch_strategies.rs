use datajpa_core::db::open_db_in_memory;
use datajpa_core::{
    EntityGraph, Member, MemberRepository, RepoError, SqliteMemberRepository,
    SqliteTeamRepository, Team, TeamRef, TeamRepository,
};
use rusqlite::Connection;

struct Fixture {
    conn: Connection,
}

impl Fixture {
    /// member1 in teamA, member2 in teamB.
    fn new() -> Self {
        let conn = open_db_in_memory().unwrap();
        {
            let teams = SqliteTeamRepository::try_new(&conn).unwrap();
            let members = SqliteMemberRepository::try_new(&conn).unwrap();
            let mut team_a = Team::new("teamA");
            let mut team_b = Team::new("teamB");
            teams.save(&mut team_a).unwrap();
            teams.save(&mut team_b).unwrap();
            members
                .save_in_team(&mut Member::with_age("member1", 10), &mut team_a)
                .unwrap();
            members
                .save_in_team(&mut Member::with_age("member2", 10), &mut team_b)
                .unwrap();
        }
        Self { conn }
    }

    fn members(&self) -> SqliteMemberRepository<'_> {
        SqliteMemberRepository::try_new(&self.conn).unwrap()
    }
}

#[test]
fn find_all_leaves_team_unloaded_until_accessed() {
    let fixture = Fixture::new();
    let repo = fixture.members();

    let mut members = repo.find_all().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members
        .iter()
        .all(|m| matches!(m.team, Some(TeamRef::Id(_)))));

    let mut team_names = Vec::new();
    for member in &mut members {
        let team = repo.load_team(member).unwrap().unwrap();
        team_names.push(team.name.clone());
    }
    assert_eq!(team_names, vec!["teamA", "teamB"]);
    assert!(members.iter().all(|m| m.team.as_ref().unwrap().is_loaded()));
}

#[test]
fn load_team_is_a_noop_for_members_without_team() {
    let fixture = Fixture::new();
    let repo = fixture.members();
    let mut loner = Member::with_age("loner", 30);
    repo.save(&mut loner).unwrap();

    assert!(repo.load_team(&mut loner).unwrap().is_none());
    assert!(loner.team.is_none());
}

#[test]
fn fetch_join_loads_team_in_one_query() {
    let fixture = Fixture::new();
    let repo = fixture.members();

    let members = repo.find_member_fetch_join().unwrap();
    assert_eq!(members.len(), 2);
    for member in &members {
        let team = member.loaded_team().expect("team fetched");
        assert!(team.has_member(member.id.unwrap()));
    }
    assert_eq!(members[0].loaded_team().unwrap().name, "teamA");
    assert_eq!(members[1].loaded_team().unwrap().name, "teamB");
}

#[test]
fn fetch_join_keeps_members_without_team() {
    let fixture = Fixture::new();
    let repo = fixture.members();
    repo.save(&mut Member::with_age("loner", 30)).unwrap();

    let members = repo.find_member_fetch_join().unwrap();
    assert_eq!(members.len(), 3);
    assert!(members[2].team.is_none());
}

#[test]
fn attribute_graph_fetches_team() {
    let fixture = Fixture::new();
    let repo = fixture.members();
    let graph = EntityGraph::attributes(&["team"]).unwrap();

    let members = repo.find_all_with_graph(&graph).unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.loaded_team().is_some()));

    let lazy = repo.find_all_with_graph(&EntityGraph::empty()).unwrap();
    assert!(lazy.iter().all(|m| m.loaded_team().is_none()));
}

#[test]
fn named_graph_fetches_each_team_for_derived_finder() {
    let fixture = Fixture::new();
    let repo = fixture.members();
    let teams = SqliteTeamRepository::try_new(&fixture.conn).unwrap();
    let mut team_b = teams.find_all().unwrap().remove(1);
    let second = repo
        .save_in_team(&mut Member::with_age("member1", 20), &mut team_b)
        .unwrap();
    let graph = EntityGraph::named("Member.all").unwrap();

    let members = repo.find_by_name_with_graph("member1", &graph).unwrap();

    assert_eq!(members.len(), 2);
    assert!(members[0].id < members[1].id);
    assert_eq!(members[1].id, Some(second));

    let first_team = members[0].loaded_team().unwrap();
    assert_eq!(first_team.name, "teamA");
    assert_eq!(first_team.members, vec![members[0].id.unwrap()]);

    let second_team = members[1].loaded_team().unwrap();
    assert_eq!(second_team.name, "teamB");
    assert_eq!(second_team.members, team_b.members);
    assert_eq!(second_team.members.len(), 2);
    assert!(second_team.has_member(second));
}

#[test]
fn unknown_graphs_are_rejected() {
    assert!(matches!(
        EntityGraph::named("Member.none"),
        Err(RepoError::UnknownEntityGraph(_))
    ));
    assert!(matches!(
        EntityGraph::attributes(&["address"]),
        Err(RepoError::UnknownEntityGraph(_))
    ));
}

//! Member use-case service.
//!
//! # Responsibility
//! - Provide stable member entry points for callers such as the CLI.
//! - Apply configured page-size bounds before paging queries.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Age pages are always sorted by name descending.

use crate::config::PagingConfig;
use crate::model::{Member, MemberDto, MemberId, Team};
use crate::paging::{MemberProperty, Page, PageRequest, Slice, Sort, SortDirection};
use crate::repo::member_repo::MemberRepository;
use crate::repo::RepoResult;
use log::info;

/// Use-case service wrapper for member operations.
pub struct MemberService<R: MemberRepository> {
    repo: R,
    paging: PagingConfig,
}

impl<R: MemberRepository> MemberService<R> {
    /// Creates a service with default paging bounds.
    pub fn new(repo: R) -> Self {
        Self::with_paging(repo, PagingConfig::default())
    }

    pub fn with_paging(repo: R, paging: PagingConfig) -> Self {
        Self { repo, paging }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Registers a new member, optionally directly in `team`.
    pub fn join(
        &self,
        name: impl Into<String>,
        age: i32,
        team: Option<&mut Team>,
    ) -> RepoResult<Member> {
        let mut member = Member::with_age(name, age);
        match team {
            Some(team) => self.repo.save_in_team(&mut member, team)?,
            None => self.repo.save(&mut member)?,
        };
        Ok(member)
    }

    pub fn get(&self, id: MemberId) -> RepoResult<Option<Member>> {
        self.repo.find_by_id(id)
    }

    /// Returns one page of members aged `age`, sorted by name descending.
    ///
    /// `size = 0` selects the configured default; larger sizes are capped.
    pub fn page_by_age(&self, age: i32, page: u32, size: u32) -> RepoResult<Page<Member>> {
        self.repo.find_by_age(age, &self.age_request(page, size))
    }

    /// Slice variant of `page_by_age` that skips the count query.
    pub fn slice_by_age(&self, age: i32, page: u32, size: u32) -> RepoResult<Slice<Member>> {
        self.repo.find_slice_by_age(age, &self.age_request(page, size))
    }

    /// Bumps the age of every member at least `age` years old.
    pub fn birthday_for_age_at_least(&self, age: i32) -> RepoResult<usize> {
        let changed = self.repo.bulk_age_plus(age)?;
        info!("event=birthday module=service status=ok from_age={age} rows={changed}");
        Ok(changed)
    }

    /// Members that belong to a team, with the team name.
    pub fn roster(&self) -> RepoResult<Vec<MemberDto>> {
        self.repo.find_member_dto()
    }

    /// All members with their teams fetched in one query.
    pub fn with_teams(&self) -> RepoResult<Vec<Member>> {
        self.repo.find_member_fetch_join()
    }

    fn age_request(&self, page: u32, size: u32) -> PageRequest {
        PageRequest::of_sorted(
            page,
            self.paging.normalize_size(size),
            Sort::by(SortDirection::Desc, MemberProperty::Name),
        )
    }
}

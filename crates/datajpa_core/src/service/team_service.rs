//! Team use-case service.

use crate::model::{Team, TeamId};
use crate::repo::team_repo::TeamRepository;
use crate::repo::{RepoError, RepoResult};

/// Use-case service wrapper for team operations.
pub struct TeamService<R: TeamRepository> {
    repo: R,
}

impl<R: TeamRepository> TeamService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates and persists a team.
    pub fn create(&self, name: impl Into<String>) -> RepoResult<Team> {
        let mut team = Team::new(name);
        self.repo.save(&mut team)?;
        Ok(team)
    }

    pub fn get(&self, id: TeamId) -> RepoResult<Option<Team>> {
        self.repo.find_by_id(id)
    }

    pub fn list(&self) -> RepoResult<Vec<Team>> {
        self.repo.find_all()
    }

    /// Renames a team and returns the stored state.
    pub fn rename(&self, id: TeamId, name: impl Into<String>) -> RepoResult<Team> {
        let mut team = self
            .repo
            .find_by_id(id)?
            .ok_or(RepoError::NotFound { entity: "team", id })?;
        team.name = name.into();
        self.repo.update(&team)?;
        Ok(team)
    }

    /// Deletes a team. Fails while members still reference it.
    pub fn delete(&self, id: TeamId) -> RepoResult<()> {
        self.repo.delete(id)
    }
}

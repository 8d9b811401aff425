//! Member domain model.
//!
//! # Responsibility
//! - Define the owning side of the member -> team association.
//! - Keep the association helper that updates both sides in one place.
//!
//! # Invariants
//! - `id` is `None` until storage assigns it at persist time.
//! - `name` is never blank and `age` stays within `0..=MAX_AGE`.
//! - `change_team` is the only way to attach a member to a team in memory.

use crate::model::team::{Team, TeamId};
use crate::model::{ModelError, ModelResult};

/// Surrogate key assigned by storage.
pub type MemberId = i64;

/// Upper bound accepted by `Member::validate`.
pub const MAX_AGE: i32 = 200;

/// Many-to-one team reference held by a member.
///
/// `Id` is what lazy finders return; resolving it costs one extra query.
/// `Loaded` is what fetch joins and entity graphs return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamRef {
    Id(TeamId),
    Loaded(Box<Team>),
}

impl TeamRef {
    /// Returns the referenced team id regardless of load state.
    ///
    /// `None` only for a `Loaded` team that was never saved.
    pub fn id(&self) -> Option<TeamId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Loaded(team) => team.id,
        }
    }

    /// Returns the team when it was fetched together with the member.
    pub fn loaded(&self) -> Option<&Team> {
        match self {
            Self::Id(_) => None,
            Self::Loaded(team) => Some(team),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Member entity mapped to the `member` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Storage-assigned identity. `None` while transient.
    pub id: Option<MemberId>,
    pub name: String,
    pub age: i32,
    /// Optional team association (`member.team_id`).
    pub team: Option<TeamRef>,
}

impl Member {
    /// Creates a transient member with age `0` and no team.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_age(name, 0)
    }

    /// Creates a transient member with the given age and no team.
    pub fn with_age(name: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            team: None,
        }
    }

    /// Creates a transient member already associated with `team`.
    ///
    /// # Errors
    /// - `ModelError::TeamNotPersisted` when `team` has no id yet.
    pub fn with_team(name: impl Into<String>, age: i32, team: &mut Team) -> ModelResult<Self> {
        let mut member = Self::with_age(name, age);
        member.change_team(team)?;
        Ok(member)
    }

    /// Sets this member's team and registers the member on the team side.
    ///
    /// A transient member only gets the reference here; the team's
    /// collection receives the id once the member is saved through
    /// `MemberRepository::save_in_team`.
    ///
    /// # Errors
    /// - `ModelError::TeamNotPersisted` when `team` has no id yet.
    pub fn change_team(&mut self, team: &mut Team) -> ModelResult<()> {
        let team_id = team.id.ok_or_else(|| ModelError::TeamNotPersisted {
            team_name: team.name.clone(),
        })?;

        self.team = Some(TeamRef::Id(team_id));
        if let Some(member_id) = self.id {
            team.add_member(member_id);
        }
        Ok(())
    }

    /// Clears the team reference and drops this member from `team`.
    pub fn leave_team(&mut self, team: &mut Team) {
        if self.team_id().is_some() && self.team_id() == team.id {
            self.team = None;
        }
        if let Some(member_id) = self.id {
            team.remove_member(member_id);
        }
    }

    /// Returns the foreign key value for `member.team_id`.
    pub fn team_id(&self) -> Option<TeamId> {
        self.team.as_ref().and_then(TeamRef::id)
    }

    /// Returns the team if it has been loaded.
    pub fn loaded_team(&self) -> Option<&Team> {
        self.team.as_ref().and_then(TeamRef::loaded)
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    /// Validates field constraints before persistence.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::BlankName { entity: "member" });
        }
        if !(0..=MAX_AGE).contains(&self.age) {
            return Err(ModelError::AgeOutOfRange {
                age: self.age,
                max: MAX_AGE,
            });
        }
        if let Some(TeamRef::Loaded(team)) = &self.team {
            if team.id.is_none() {
                return Err(ModelError::TeamNotPersisted {
                    team_name: team.name.clone(),
                });
            }
        }
        Ok(())
    }
}

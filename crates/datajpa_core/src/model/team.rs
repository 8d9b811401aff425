//! Team domain model (inverse side of the member association).

use crate::model::member::MemberId;
use crate::model::{ModelError, ModelResult};

/// Surrogate key assigned by storage.
pub type TeamId = i64;

/// Team entity mapped to the `team` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Storage-assigned identity. `None` while transient.
    pub id: Option<TeamId>,
    pub name: String,
    /// Ids of members whose `team_id` points here, in id order when loaded.
    pub members: Vec<MemberId>,
}

impl Team {
    /// Creates a transient team without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds `member_id` to the collection. Adding twice is a no-op.
    pub fn add_member(&mut self, member_id: MemberId) {
        if !self.has_member(member_id) {
            self.members.push(member_id);
        }
    }

    pub fn remove_member(&mut self, member_id: MemberId) {
        self.members.retain(|id| *id != member_id);
    }

    pub fn has_member(&self, member_id: MemberId) -> bool {
        self.members.contains(&member_id)
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::BlankName { entity: "team" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Team;

    #[test]
    fn add_member_is_idempotent() {
        let mut team = Team::new("teamA");
        team.add_member(1);
        team.add_member(1);
        team.add_member(2);
        assert_eq!(team.members, vec![1, 2]);

        team.remove_member(1);
        assert_eq!(team.members, vec![2]);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Team::new("").validate().is_err());
        assert!(Team::new("teamA").validate().is_ok());
    }
}

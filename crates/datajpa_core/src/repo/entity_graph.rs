//! Entity graphs: which associations a finder loads eagerly.
//!
//! A finder given a graph that includes `team` runs one joined query instead
//! of leaving `TeamRef::Id` references for later lazy loads.

use crate::repo::{RepoError, RepoResult};

/// Member associations that can be prefetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAttribute {
    Team,
}

impl MemberAttribute {
    fn parse(path: &str) -> Option<Self> {
        match path {
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

/// Graphs registered by name on the member entity.
const NAMED_GRAPHS: &[(&str, &[MemberAttribute])] = &[("Member.all", &[MemberAttribute::Team])];

/// Set of associations to fetch together with members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityGraph {
    attributes: Vec<MemberAttribute>,
}

impl EntityGraph {
    /// Graph that fetches nothing extra (lazy associations).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an ad-hoc graph from attribute paths such as `["team"]`.
    pub fn attributes(paths: &[&str]) -> RepoResult<Self> {
        let mut attributes = Vec::with_capacity(paths.len());
        for path in paths {
            let attribute = MemberAttribute::parse(path.trim())
                .ok_or_else(|| RepoError::UnknownEntityGraph((*path).to_string()))?;
            if !attributes.contains(&attribute) {
                attributes.push(attribute);
            }
        }
        Ok(Self { attributes })
    }

    /// Looks up a graph registered by name, e.g. `Member.all`.
    pub fn named(name: &str) -> RepoResult<Self> {
        NAMED_GRAPHS
            .iter()
            .find(|(graph_name, _)| *graph_name == name)
            .map(|(_, attributes)| Self {
                attributes: attributes.to_vec(),
            })
            .ok_or_else(|| RepoError::UnknownEntityGraph(name.to_string()))
    }

    pub fn fetches(&self, attribute: MemberAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn fetches_team(&self) -> bool {
        self.fetches(MemberAttribute::Team)
    }
}

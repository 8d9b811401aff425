//! Read-only projections built directly by queries.

use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};

/// Member row joined with its team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: MemberId,
    #[serde(rename = "username")]
    pub name: String,
    pub team_name: String,
}

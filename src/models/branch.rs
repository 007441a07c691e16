use serde::{Deserialize, Serialize};

/// Branch reference row as served by `GET /branches`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    #[serde(rename = "branch")]
    pub name: String,
}

/// Looks up the display name of a branch id
pub fn branch_name(branches: &[Branch], id: i64) -> Option<&str> {
    branches
        .iter()
        .find(|branch| branch.id == id)
        .map(|branch| branch.name.as_str())
}

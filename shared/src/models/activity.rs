//! Activity log models

use serde::{Deserialize, Serialize};

/// Kinds of activity recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Pickup,
    Update,
    Request,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Pickup => "PICKUP",
            ActivityType::Update => "UPDATE",
            ActivityType::Request => "REQUEST",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PICKUP" => Some(ActivityType::Pickup),
            "UPDATE" => Some(ActivityType::Update),
            "REQUEST" => Some(ActivityType::Request),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Anchor;

/// Identifier shared by every decoration of one highlighting action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("group-{}", millis))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Issues time-derived group ids that never repeat within one clock
#[derive(Debug, Clone, Default)]
pub struct GroupIdClock {
    last: i64,
}

impl GroupIdClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> GroupId {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Id for `millis`, bumped past the last issued one if needed
    pub fn next_at(&mut self, millis: i64) -> GroupId {
        self.last = millis.max(self.last + 1);
        GroupId::from_millis(self.last)
    }
}

/// The persisted record of one highlighting action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "nodes", default)]
    pub anchors: Vec<Anchor>,
}

impl Group {
    pub fn new(id: GroupId, color: impl Into<String>, anchors: Vec<Anchor>) -> Self {
        Self {
            id,
            color: color.into(),
            anchors,
        }
    }

    /// The group's colour, or `fallback` when none was stored
    pub fn color_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.color.is_empty() {
            fallback
        } else {
            &self.color
        }
    }
}

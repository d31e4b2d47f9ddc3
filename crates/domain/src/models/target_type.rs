//! Registry of entity types that custom fields and enums attach to.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Entity type a field or enum definition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Student,
    Guardian,
    Staff,
    Employee,
    Department,
    Admission,
    Enquiry,
    Visitor,
}

impl TargetType {
    pub const ALL: [TargetType; 8] = [
        TargetType::Student,
        TargetType::Guardian,
        TargetType::Staff,
        TargetType::Employee,
        TargetType::Department,
        TargetType::Admission,
        TargetType::Enquiry,
        TargetType::Visitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Student => "student",
            TargetType::Guardian => "guardian",
            TargetType::Staff => "staff",
            TargetType::Employee => "employee",
            TargetType::Department => "department",
            TargetType::Admission => "admission",
            TargetType::Enquiry => "enquiry",
            TargetType::Visitor => "visitor",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown target type: {0}")]
pub struct UnknownTargetType(pub String);

impl FromStr for TargetType {
    type Err = UnknownTargetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTargetType(s.to_string()))
    }
}

//! Qualitative machine sizing tiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Machine size class, ordered from smallest to largest.
///
/// The tier picks the per-tier default column in the rule catalog and the
/// `shared_buffers` RAM fraction; it is a user statement of intent, not a
/// measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Mini,
    Medium,
    Large,
    Mall,
    Bigt,
    Huge,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Mini,
        Tier::Medium,
        Tier::Large,
        Tier::Mall,
        Tier::Bigt,
        Tier::Huge,
    ];

    /// Index into a per-tier default column.
    pub fn index(self) -> usize {
        match self {
            Tier::Mini => 0,
            Tier::Medium => 1,
            Tier::Large => 2,
            Tier::Mall => 3,
            Tier::Bigt => 4,
            Tier::Huge => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Mini => "mini",
            Tier::Medium => "medium",
            Tier::Large => "large",
            Tier::Mall => "mall",
            Tier::Bigt => "bigt",
            Tier::Huge => "huge",
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mini" => Ok(Tier::Mini),
            "medium" => Ok(Tier::Medium),
            "large" => Ok(Tier::Large),
            "mall" => Ok(Tier::Mall),
            "bigt" => Ok(Tier::Bigt),
            "huge" => Ok(Tier::Huge),
            other => Err(format!("unknown sizing tier '{other}'")),
        }
    }
}

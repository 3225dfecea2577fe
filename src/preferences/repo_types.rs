use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Explicit user/food relation recorded by a nutritionist or the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecificityType {
    Allergic,
    Intolerant,
    Sensitive,
    Like,
    DontLike,
}

impl SpecificityType {
    /// Sign of the propagated preference; `None` for the "must not eat" kinds.
    pub fn polarity(self) -> Option<i64> {
        match self {
            SpecificityType::Like => Some(1),
            SpecificityType::DontLike => Some(-1),
            _ => None,
        }
    }
}

impl FromStr for SpecificityType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ALLERGIC" => SpecificityType::Allergic,
            "INTOLERANT" => SpecificityType::Intolerant,
            "SENSITIVE" => SpecificityType::Sensitive,
            "LIKE" => SpecificityType::Like,
            "DONT_LIKE" | "DON'T_LIKE" => SpecificityType::DontLike,
            other => anyhow::bail!("unknown specificity type {other:?}"),
        })
    }
}

#[derive(Debug, FromRow)]
pub struct SpecificityRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub specificity_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specificity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_id: Uuid,
    pub kind: SpecificityType,
}

impl TryFrom<SpecificityRow> for Specificity {
    type Error = anyhow::Error;

    fn try_from(r: SpecificityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            food_id: r.food_id,
            kind: r.specificity_type.parse()?,
        })
    }
}

/// How many times a food was eaten (through diary items) in a window.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Consumption {
    pub food_id: Uuid,
    pub count: i64,
}

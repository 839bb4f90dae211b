use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::types::TagId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagCategory {
    Language,
    Framework,
}

impl TagCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::Language => "LANGUAGE",
            TagCategory::Framework => "FRAMEWORK",
        }
    }
}

impl FromStr for TagCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LANGUAGE" => Ok(TagCategory::Language),
            "FRAMEWORK" => Ok(TagCategory::Framework),
            other => Err(format!("unknown tag category: {}", other)),
        }
    }
}

/// Immutable catalog entry referenced by posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub category: TagCategory,
}

#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub id: TagId,
    pub name: String,
    pub category: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = String;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(Tag {
            id: row.id,
            name: row.name,
            category: row.category.parse()?,
        })
    }
}

/// Catalog seeded into an empty tag table
pub const DEFAULT_TAGS: &[(&str, TagCategory)] = &[
    ("Java", TagCategory::Language),
    ("Python", TagCategory::Language),
    ("JavaScript", TagCategory::Language),
    ("TypeScript", TagCategory::Language),
    ("C", TagCategory::Language),
    ("C++", TagCategory::Language),
    ("C#", TagCategory::Language),
    ("Go", TagCategory::Language),
    ("Rust", TagCategory::Language),
    ("Kotlin", TagCategory::Language),
    ("Swift", TagCategory::Language),
    ("Ruby", TagCategory::Language),
    ("PHP", TagCategory::Language),
    ("Spring", TagCategory::Framework),
    ("React", TagCategory::Framework),
    ("Vue", TagCategory::Framework),
    ("Angular", TagCategory::Framework),
    ("Node.js", TagCategory::Framework),
    ("Django", TagCategory::Framework),
    ("FastAPI", TagCategory::Framework),
    (".NET", TagCategory::Framework),
    ("Flutter", TagCategory::Framework),
];

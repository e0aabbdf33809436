//! Tags, event categories and project goal kinds

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{CollectivError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct EventCategory {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagNamesRequest {
    pub tags: Vec<String>,
}

/// Trimmed, lower-cased category name of at least three characters
pub fn normalize_category_name(name: &str) -> Result<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.chars().count() < 3 {
        return Err(CollectivError::invalid("Category name must be at least 3 characters"));
    }
    Ok(normalized)
}

/// Trimmed, lower-cased, de-duplicated tag names, skipping blanks
pub fn normalize_tag_names(names: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let tag = name.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > 50 {
            return Err(CollectivError::invalid("Tag names must be at most 50 characters"));
        }
        if !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    Ok(normalized)
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::slugify;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Normalized form of a user-supplied tag name: trimmed, inner whitespace collapsed.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize tag names, dropping blanks and names that slugify to a slug already seen.
pub fn clean_tag_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut cleaned = Vec::new();
    for name in names.into_iter().map(normalize_name) {
        let slug = slugify(&name);
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }
        seen.push(slug);
        cleaned.push(name);
    }
    cleaned
}

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Status {
    #[default]
    #[serde(rename = "draft")]
    #[sqlx(rename = "draft")]
    Draft,
    #[serde(rename = "published")]
    #[sqlx(rename = "published")]
    Published,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Draft => write!(f, "draft"),
            Status::Published => write!(f, "published"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Status::Draft),
            "published" => Ok(Status::Published),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// A post row joined with its author's username.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author_id: i64,
    pub author: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: Status,
}

impl Post {
    /// Site-relative URL of the detail page: `/blog/{year}/{month}/{day}/{slug}/`.
    pub fn absolute_url(&self) -> String {
        format!(
            "/blog/{}/{}/{}/{}/",
            self.publish.year(),
            self.publish.month(),
            self.publish.day(),
            self.slug
        )
    }

    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }
}

/// Derive a URL slug from free text.
///
/// Letters and digits are kept (lowercased, Unicode included), runs of
/// whitespace, hyphens and underscores become a single hyphen, everything
/// else is dropped. Leading and trailing hyphens are stripped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}

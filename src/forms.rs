//! Input forms shared by the HTML pages and the JSON API.
//!
//! Validators return a field → message map; an empty map means the input is valid.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::models::{Status, slugify};

pub type FormErrors = HashMap<String, String>;

fn require(errors: &mut FormErrors, field: &str, value: &str, label: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), format!("{label} is required"));
        return false;
    }
    true
}

fn max_chars(errors: &mut FormErrors, field: &str, value: &str, label: &str, max: usize) {
    if value.trim().chars().count() > max {
        errors.insert(
            field.to_string(),
            format!("{label} must be at most {max} characters"),
        );
    }
}

fn email(errors: &mut FormErrors, field: &str, value: &str, label: &str) {
    if require(errors, field, value, label) && !value.trim().to_string().validate_email() {
        errors.insert(field.to_string(), "Enter a valid email address".to_string());
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub name: String,
    pub email: String,
    pub body: String,
}

impl CommentForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if require(&mut errors, "name", &self.name, "Name") {
            max_chars(&mut errors, "name", &self.name, "Name", 80);
        }
        email(&mut errors, "email", &self.email, "Email");
        require(&mut errors, "body", &self.body, "Comment");
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShareForm {
    pub name: String,
    pub your_email: String,
    pub to_whom: String,
    pub comments: String,
}

impl ShareForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if require(&mut errors, "name", &self.name, "Name") {
            max_chars(&mut errors, "name", &self.name, "Name", 30);
        }
        email(&mut errors, "your_email", &self.your_email, "Your email");
        email(&mut errors, "to_whom", &self.to_whom, "Recipient email");
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    pub query: Option<String>,
}

impl SearchForm {
    /// The trimmed query, `None` when absent or blank.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<String>,
    pub tag_slug: Option<String>,
}

/// Post payload accepted by the API and the importer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub slug: Option<String>,
    pub body: String,
    pub status: Option<Status>,
    pub publish: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl PostForm {
    /// The explicit slug if given, otherwise one derived from the title.
    pub fn resolved_slug(&self) -> String {
        match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => slugify(slug),
            None => slugify(&self.title),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if require(&mut errors, "title", &self.title, "Title") {
            max_chars(&mut errors, "title", &self.title, "Title", 250);
            let slug = self.resolved_slug();
            if slug.is_empty() {
                errors.insert("slug".to_string(), "Slug could not be derived from the title".to_string());
            } else if slug.chars().count() > 250 {
                errors.insert("slug".to_string(), "Slug must be at most 250 characters".to_string());
            }
        }
        require(&mut errors, "body", &self.body, "Body");
        errors
    }
}

/// Partial update for an existing post; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostUpdateForm {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub status: Option<Status>,
    pub publish: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

pub fn validate_image_title(title: &str) -> FormErrors {
    let mut errors = FormErrors::new();
    if require(&mut errors, "title", title, "Title") {
        max_chars(&mut errors, "title", title, "Title", 200);
        if title.contains(['/', '\\']) || title.trim().starts_with('.') {
            errors.insert("title".to_string(), "Title cannot be used as a file name".to_string());
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(name: &str, email: &str, body: &str) -> CommentForm {
        CommentForm {
            name: name.into(),
            email: email.into(),
            body: body.into(),
        }
    }

    #[test]
    fn valid_comment_has_no_errors() {
        assert!(comment("Ann", "ann@example.com", "Nice post").validate().is_empty());
    }

    #[test]
    fn blank_comment_fields_are_reported() {
        let errors = comment("  ", "", "").validate();
        assert_eq!(errors.get("name").unwrap(), "Name is required");
        assert_eq!(errors.get("email").unwrap(), "Email is required");
        assert_eq!(errors.get("body").unwrap(), "Comment is required");
    }

    #[test]
    fn malformed_email_is_reported() {
        let errors = comment("Ann", "not-an-email", "Hi").validate();
        assert_eq!(errors.get("email").unwrap(), "Enter a valid email address");
    }

    #[test]
    fn share_requires_both_addresses() {
        let form = ShareForm {
            name: "Ann".into(),
            your_email: "ann@example.com".into(),
            to_whom: "bob@".into(),
            comments: String::new(),
        };
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("to_whom"));
    }

    #[test]
    fn share_name_is_limited() {
        let form = ShareForm {
            name: "x".repeat(31),
            your_email: "ann@example.com".into(),
            to_whom: "bob@example.com".into(),
            comments: String::new(),
        };
        assert!(form.validate().contains_key("name"));
    }

    #[test]
    fn search_query_ignores_blank() {
        assert_eq!(SearchForm { query: Some("  ".into()) }.query(), None);
        assert_eq!(SearchForm { query: Some(" rust ".into()) }.query(), Some("rust"));
        assert_eq!(SearchForm::default().query(), None);
    }

    #[test]
    fn post_slug_falls_back_to_title() {
        let form = PostForm {
            title: "Hello World".into(),
            body: "text".into(),
            ..PostForm::default()
        };
        assert_eq!(form.resolved_slug(), "hello-world");
        assert!(form.validate().is_empty());
    }

    #[test]
    fn post_with_unsluggable_title_is_invalid() {
        let form = PostForm {
            title: "???".into(),
            body: "text".into(),
            ..PostForm::default()
        };
        assert!(form.validate().contains_key("slug"));
    }

    #[test]
    fn image_title_cannot_escape_media_root() {
        assert!(validate_image_title("Sunset").is_empty());
        assert!(validate_image_title("../etc/passwd").contains_key("title"));
        assert!(validate_image_title(".hidden").contains_key("title"));
    }
}

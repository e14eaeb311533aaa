use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Image {
    pub id: i64,
    pub title: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn url(&self) -> String {
        format!("/media/{}", self.file)
    }
}

/// Stored filename for an upload: `<title>.<ext>`, where `ext` is whatever
/// follows the last `.` of the uploaded name (the whole name when it has none).
///
/// `None` when that extension is empty or could not be a file name component.
pub fn stored_filename(title: &str, original: &str) -> Option<String> {
    let ext = original.rsplit('.').next().unwrap_or(original);
    if ext.is_empty() || ext.contains(['/', '\\', '\0']) {
        return None;
    }
    Some(format!("{title}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_title_and_original_extension() {
        assert_eq!(stored_filename("Sunset", "photo.jpg").unwrap(), "Sunset.jpg");
        assert_eq!(stored_filename("Archive", "backup.tar.gz").unwrap(), "Archive.gz");
    }

    #[test]
    fn filename_without_extension_reuses_name() {
        assert_eq!(stored_filename("Raw", "scan").unwrap(), "Raw.scan");
    }

    #[test]
    fn unusable_extensions_are_refused() {
        assert_eq!(stored_filename("Sunset", "photo.jpg/evil"), None);
        assert_eq!(stored_filename("Sunset", "photo.jpg\\evil"), None);
        assert_eq!(stored_filename("Sunset", "photo."), None);
        assert_eq!(stored_filename("Sunset", "bad\0ext"), None);
    }
}

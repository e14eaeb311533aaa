//! File-backed asset store for uploaded images and the image lifecycle around it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;
use crate::forms::validate_image_title;
use crate::models::{Image, image::stored_filename, now};

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn exists(&self, name: &str) -> io::Result<bool>;
    /// Store `bytes` under `name`, or under a free variant of it when taken.
    /// Returns the name actually used.
    async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<String>;
    async fn delete(&self, name: &str) -> io::Result<()>;
}

pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to store file named {name:?}"),
            ));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn exists(&self, name: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.path(name)?).await
    }

    async fn save(&self, name: &str, bytes: &[u8]) -> io::Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        // create_new claims the name atomically; a taken name moves on to a suffixed one
        let mut candidate = name.to_string();
        let mut file = loop {
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path(&candidate)?)
                .await;
            match opened {
                Ok(file) => break file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    let suffix = Uuid::new_v4().simple().to_string();
                    candidate = alternative_name(name, &suffix[..7]);
                }
                Err(e) => return Err(e),
            }
        };

        if let Err(e) = write_all(&mut file, bytes).await {
            drop(file);
            let _ = tokio::fs::remove_file(self.path(&candidate)?).await;
            return Err(e);
        }
        Ok(candidate)
    }

    async fn delete(&self, name: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.path(name)?).await
    }
}

async fn write_all(file: &mut tokio::fs::File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// `name` with `_<suffix>` inserted before its extension.
pub fn alternative_name(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{name}_{suffix}"),
    }
}

/// Validate, store the upload as `<title>.<ext>`, then record it.
pub async fn create_image(
    db: &SqlitePool,
    store: &dyn MediaStore,
    title: &str,
    original_filename: &str,
    bytes: &[u8],
) -> Result<Image, AppError> {
    let errors = validate_image_title(title);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    if original_filename.trim().is_empty() || bytes.is_empty() {
        return Err(AppError::invalid("image", "An image file is required"));
    }

    let title = title.trim();
    let Some(name) = stored_filename(title, original_filename) else {
        return Err(AppError::invalid("image", "The uploaded file name has an unusable extension"));
    };
    let file = store.save(&name, bytes).await?;
    tracing::info!(%file, "stored image");

    let inserted = sqlx::query_as::<_, Image>(
        "INSERT INTO images (title, file, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(&file)
    .bind(now())
    .fetch_one(db)
    .await;

    match inserted {
        Ok(image) => Ok(image),
        Err(e) => {
            if let Err(cleanup) = store.delete(&file).await {
                tracing::warn!(%file, "failed to remove orphaned upload: {cleanup}");
            }
            Err(e.into())
        }
    }
}

/// Delete an image record, removing its stored file first when it still exists.
///
/// File removal is best-effort: the record goes away even if the file is
/// missing or cannot be deleted.
pub async fn delete_image(db: &SqlitePool, store: &dyn MediaStore, id: i64) -> Result<(), AppError> {
    let image: Option<Image> = sqlx::query_as("SELECT * FROM images WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    let Some(image) = image else {
        return Err(AppError::NotFound);
    };

    match store.exists(&image.file).await {
        Ok(true) => match store.delete(&image.file).await {
            Ok(()) => tracing::info!(file = %image.file, "removed image file"),
            Err(e) => tracing::warn!(file = %image.file, "failed to remove image file: {e}"),
        },
        Ok(false) => tracing::debug!(file = %image.file, "image file already absent"),
        Err(e) => tracing::warn!(file = %image.file, "failed to check image file: {e}"),
    }

    sqlx::query("DELETE FROM images WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FsMediaStore {
        FsMediaStore::new(std::env::temp_dir().join(format!("thoughts-media-{}", Uuid::new_v4())))
    }

    #[test]
    fn alternative_name_keeps_extension() {
        assert_eq!(alternative_name("Sunset.jpg", "abc1234"), "Sunset_abc1234.jpg");
        assert_eq!(alternative_name("Raw", "abc1234"), "Raw_abc1234");
    }

    #[tokio::test]
    async fn save_picks_free_name_on_collision() {
        let store = temp_store();
        let first = store.save("Sunset.jpg", b"one").await.unwrap();
        let second = store.save("Sunset.jpg", b"two").await.unwrap();

        assert_eq!(first, "Sunset.jpg");
        assert_ne!(second, first);
        assert!(second.starts_with("Sunset_") && second.ends_with(".jpg"));
        assert!(store.exists(&second).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_saves_never_share_a_name() {
        let store = std::sync::Arc::new(temp_store());
        for round in 0..50 {
            let name = format!("img{round}.jpg");
            let handles: Vec<_> = (0..2u8)
                .map(|i| {
                    let store = store.clone();
                    let name = name.clone();
                    tokio::spawn(async move { store.save(&name, &[i]).await.unwrap() })
                })
                .collect();

            let mut saved = Vec::new();
            for handle in handles {
                saved.push(handle.await.unwrap());
            }
            assert_ne!(saved[0], saved[1], "round {round}");
            let mut contents = Vec::new();
            for file in &saved {
                contents.extend(tokio::fs::read(store.root().join(file)).await.unwrap());
            }
            contents.sort();
            assert_eq!(contents, vec![0, 1], "round {round}");
        }
    }

    #[tokio::test]
    async fn rejects_names_outside_root() {
        let store = temp_store();
        assert!(store.save("../escape.jpg", b"x").await.is_err());
        assert!(store.exists(".hidden").await.is_err());
    }

    #[tokio::test]
    async fn delete_missing_file_is_an_error() {
        let store = temp_store();
        assert!(store.delete("missing.jpg").await.is_err());
    }
}

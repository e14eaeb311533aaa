use anyhow::{Context, bail};
use sqlx::SqlitePool;
use std::fs;

use crate::auth::hash_password;
use crate::authoring::insert_post;
use crate::error::AppError;
use crate::forms::PostForm;
use crate::models::{User, now};

/// Import a JSON array of posts for `author`, all or nothing.
pub async fn import_posts(pool: &SqlitePool, file_path: &str, author: &str) -> anyhow::Result<usize> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(author)
        .fetch_optional(pool)
        .await?;
    let Some(user) = user else {
        bail!("user '{author}' not found");
    };

    let content = fs::read_to_string(file_path).with_context(|| format!("failed to read {file_path}"))?;
    let posts: Vec<PostForm> = serde_json::from_str(&content).context("invalid posts file")?;

    let mut tx = pool.begin().await?;
    for (i, form) in posts.iter().enumerate() {
        match insert_post(&mut tx, user.id, form).await {
            Ok(_) => {}
            Err(AppError::Validation(errors)) => {
                let mut fields: Vec<String> = errors.into_iter().map(|(f, m)| format!("{f}: {m}")).collect();
                fields.sort();
                bail!("post #{} ({:?}) is invalid: {}", i + 1, form.title, fields.join("; "));
            }
            Err(e) => return Err(e.into()),
        }
    }
    tx.commit().await?;

    tracing::info!(count = posts.len(), author, "imported posts");
    Ok(posts.len())
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> anyhow::Result<User> {
    let username = username.trim();
    if username.is_empty() {
        bail!("username must not be empty");
    }
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash, is_active, created_at)
        VALUES (?, ?, ?, 1, ?)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(now())
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to create user '{username}'"))?;

    Ok(user)
}

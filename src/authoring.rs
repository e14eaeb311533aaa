//! Write side of the content store: posts, their tags, and comments.
//!
//! Each write runs as validate → derive (slug, timestamps) → persist.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::forms::{CommentForm, PostForm, PostUpdateForm};
use crate::models::tag::clean_tag_names;
use crate::models::{Comment, Post, now, slugify};
use crate::queries::{POST_SELECT, day_bounds};

const SLUG_TAKEN: &str = "Slug must be unique for the publish date";

/// Post by id regardless of status, for authoring callers only.
pub async fn post_by_id(db: &SqlitePool, id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as(&format!("{POST_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

async fn slug_taken(
    conn: &mut SqliteConnection,
    slug: &str,
    publish: DateTime<Utc>,
    exclude: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (start, end) = day_bounds(publish.date_naive());
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM posts WHERE slug = ? AND publish >= ? AND publish < ? AND id != ?",
    )
    .bind(slug)
    .bind(start)
    .bind(end)
    .bind(exclude.unwrap_or(-1))
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

async fn get_or_create_tag(conn: &mut SqliteConnection, name: &str) -> Result<i64, sqlx::Error> {
    let slug = slugify(name);
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = ?")
        .bind(&slug)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (i64,) = sqlx::query_as("INSERT INTO tags (name, slug) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(&slug)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

/// Replace the tag set of a post, creating unknown tags on the way.
async fn set_tags(conn: &mut SqliteConnection, post_id: i64, names: &[String]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    for name in clean_tag_names(names.iter().map(String::as_str)) {
        let tag_id = get_or_create_tag(conn, &name).await?;
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Validate and insert a post with its tags on an open connection or transaction.
pub async fn insert_post(
    conn: &mut SqliteConnection,
    author_id: i64,
    form: &PostForm,
) -> Result<i64, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let slug = form.resolved_slug();
    let publish = form.publish.map(|p| p.trunc_subsecs(0)).unwrap_or_else(now);
    if slug_taken(conn, &slug, publish, None).await? {
        return Err(AppError::invalid("slug", SLUG_TAKEN));
    }

    let created = now();
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, slug, author_id, body, publish, created_at, updated_at, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(form.title.trim())
    .bind(&slug)
    .bind(author_id)
    .bind(&form.body)
    .bind(publish)
    .bind(created)
    .bind(created)
    .bind(form.status.unwrap_or_default())
    .fetch_one(&mut *conn)
    .await?;

    set_tags(conn, id, &form.tags).await?;
    Ok(id)
}

pub async fn create_post(db: &SqlitePool, author_id: i64, form: &PostForm) -> Result<Post, AppError> {
    let mut tx = db.begin().await?;
    let id = insert_post(&mut tx, author_id, form).await?;
    tx.commit().await?;

    tracing::info!(post_id = id, "created post");
    post_by_id(db, id).await?.ok_or(AppError::NotFound)
}

/// Apply a partial update. The slug is kept unless one is supplied explicitly.
pub async fn update_post(db: &SqlitePool, post: &Post, update: PostUpdateForm) -> Result<Post, AppError> {
    let tags = update.tags.clone();
    let merged = PostForm {
        title: update.title.unwrap_or_else(|| post.title.clone()),
        slug: Some(update.slug.unwrap_or_else(|| post.slug.clone())),
        body: update.body.unwrap_or_else(|| post.body.clone()),
        status: Some(update.status.unwrap_or(post.status)),
        publish: Some(update.publish.map(|p| p.trunc_subsecs(0)).unwrap_or(post.publish)),
        tags: Vec::new(),
    };

    let errors = merged.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let slug = merged.resolved_slug();
    let publish = merged.publish.unwrap_or(post.publish);

    let mut tx = db.begin().await?;
    if slug_taken(&mut tx, &slug, publish, Some(post.id)).await? {
        return Err(AppError::invalid("slug", SLUG_TAKEN));
    }

    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, slug = ?, body = ?, publish = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(merged.title.trim())
    .bind(&slug)
    .bind(&merged.body)
    .bind(publish)
    .bind(merged.status.unwrap_or(post.status))
    .bind(now())
    .bind(post.id)
    .execute(&mut *tx)
    .await?;

    if let Some(tags) = tags {
        set_tags(&mut tx, post.id, &tags).await?;
    }
    tx.commit().await?;

    tracing::info!(post_id = post.id, "updated post");
    post_by_id(db, post.id).await?.ok_or(AppError::NotFound)
}

pub async fn delete_post(db: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    tracing::info!(post_id = id, "deleted post");
    Ok(())
}

/// Validate and store an active comment on `post_id`; nothing is written on invalid input.
pub async fn create_comment(db: &SqlitePool, post_id: i64, form: &CommentForm) -> Result<Comment, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let comment: Comment = sqlx::query_as(
        r#"
        INSERT INTO comments (post_id, name, email, body, created_at, active)
        VALUES (?, ?, ?, ?, ?, 1)
        RETURNING *
        "#,
    )
    .bind(post_id)
    .bind(form.name.trim())
    .bind(form.email.trim())
    .bind(form.body.trim())
    .bind(now())
    .fetch_one(db)
    .await?;

    tracing::info!(post_id, comment_id = comment.id, "comment created");
    Ok(comment)
}

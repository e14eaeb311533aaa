//! Token-authenticated JSON API over posts, comments and sharing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::auth::ApiUser;
use crate::authoring;
use crate::error::{ApiError, AppError};
use crate::forms::{CommentForm, ListQuery, PostForm, PostUpdateForm, SearchForm, ShareForm};
use crate::models::{Comment, Post, Status};
use crate::queries::{self, PostFilter};
use crate::routes::share::send_share;
use crate::search::Strategy;
use crate::AppState;

type DatePath = Path<(String, String, String, String)>;

#[derive(Serialize)]
pub struct PostJson {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: Status,
    pub tags: Vec<String>,
    pub url: String,
}

impl PostJson {
    async fn load(db: &SqlitePool, post: Post) -> Result<Self, sqlx::Error> {
        let tags = queries::tags_for_post(db, post.id).await?;
        let url = post.absolute_url();
        Ok(Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            author: post.author,
            body: post.body,
            publish: post.publish,
            created: post.created_at,
            updated: post.updated_at,
            status: post.status,
            tags: tags.into_iter().map(|t| t.name).collect(),
            url,
        })
    }

    async fn load_all(db: &SqlitePool, posts: Vec<Post>) -> Result<Vec<Self>, sqlx::Error> {
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            out.push(Self::load(db, post).await?);
        }
        Ok(out)
    }
}

#[derive(Serialize)]
pub struct CommentJson {
    pub id: i64,
    pub post: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub active: bool,
}

impl From<Comment> for CommentJson {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post: c.post_id,
            name: c.name,
            email: c.email,
            body: c.body,
            created: c.created_at,
            active: c.active,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts/", get(list_posts).post(create_post))
        .route("/api/posts/search/", get(search_posts))
        .route(
            "/api/posts/{id}/{month}/{day}/{slug}/",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/share/", post(share_post))
        .route("/api/posts/{id}/comment/", post(create_comment))
}

async fn list_posts(
    State(state): State<AppState>,
    _user: ApiUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PostJson>>, ApiError> {
    let filter = match query.tag_slug.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => {
            let tag = queries::tag_by_slug(&state.db, slug)
                .await?
                .ok_or(AppError::NotFound)?;
            PostFilter::published().tagged(&tag)
        }
        None => PostFilter::published(),
    };

    let posts = queries::list_posts(&state.db, filter, None).await?;
    Ok(Json(PostJson::load_all(&state.db, posts).await?))
}

async fn create_post(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(form): Json<PostForm>,
) -> Result<impl IntoResponse, ApiError> {
    let post = authoring::create_post(&state.db, user.id, &form).await?;
    let body = PostJson::load(&state.db, post).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

async fn published_by_path(db: &SqlitePool, path: DatePath) -> Result<Post, ApiError> {
    let Path((year, month, day, slug)) = path;
    queries::published_post_by_segments(db, &year, &month, &day, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound.into())
}

async fn get_post(
    State(state): State<AppState>,
    _user: ApiUser,
    path: DatePath,
) -> Result<Json<PostJson>, ApiError> {
    let post = published_by_path(&state.db, path).await?;
    Ok(Json(PostJson::load(&state.db, post).await?))
}

async fn update_post(
    State(state): State<AppState>,
    _user: ApiUser,
    path: DatePath,
    Json(update): Json<PostUpdateForm>,
) -> Result<Json<PostJson>, ApiError> {
    let post = published_by_path(&state.db, path).await?;
    let updated = authoring::update_post(&state.db, &post, update).await?;
    Ok(Json(PostJson::load(&state.db, updated).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    _user: ApiUser,
    path: DatePath,
) -> Result<StatusCode, ApiError> {
    let post = published_by_path(&state.db, path).await?;
    authoring::delete_post(&state.db, post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn published_by_id(db: &SqlitePool, id: i64) -> Result<Post, ApiError> {
    queries::published_post_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound.into())
}

async fn share_post(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<i64>,
    Json(form): Json<ShareForm>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = published_by_id(&state.db, id).await?;
    send_share(&state, &post, &form).await?;
    Ok(Json(json!({ "status": "sent" })))
}

async fn create_comment(
    State(state): State<AppState>,
    _user: ApiUser,
    Path(id): Path<i64>,
    Json(form): Json<CommentForm>,
) -> Result<impl IntoResponse, ApiError> {
    let post = published_by_id(&state.db, id).await?;
    let comment = authoring::create_comment(&state.db, post.id, &form).await?;
    Ok((StatusCode::CREATED, Json(CommentJson::from(comment))))
}

async fn search_posts(
    State(state): State<AppState>,
    _user: ApiUser,
    Query(form): Query<SearchForm>,
) -> Result<Json<Vec<PostJson>>, ApiError> {
    let posts = match form.query() {
        Some(query) => queries::search_posts(&state.db, query, Strategy::default()).await?,
        None => Vec::new(),
    };
    Ok(Json(PostJson::load_all(&state.db, posts).await?))
}

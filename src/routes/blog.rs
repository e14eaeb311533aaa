use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::forms::{CommentForm, FormErrors, ListQuery};
use crate::models::Tag;
use crate::pagination::{PageInfo, Paginator, POSTS_PER_PAGE};
use crate::queries::{self, PostFilter};
use crate::routes::views::{post_cards, CommentView, Layout, PostCard, PostLink};
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/list.html")]
struct PostListTemplate {
    layout: Layout,
    posts: Vec<PostCard>,
    tag: Option<Tag>,
    page: PageInfo,
    base_path: String,
}

#[derive(Template)]
#[template(path = "posts/detail.html")]
struct PostDetailTemplate {
    layout: Layout,
    post: PostCard,
    post_id: i64,
    comments: Vec<CommentView>,
    similar: Vec<PostLink>,
    form: CommentForm,
    errors: FormErrors,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog/", get(list_posts))
        .route("/blog/tag/{tag_slug}/", get(list_posts_by_tag))
        // Shares its first segment with `/blog/{id}/share/`; the router wants
        // one parameter name per position, so the year is captured as `{id}`.
        .route("/blog/{id}/{month}/{day}/{slug}/", get(post_detail))
}

async fn render_list(
    state: &AppState,
    tag: Option<Tag>,
    raw_page: Option<&str>,
) -> Result<Html<String>, AppError> {
    let filter = match &tag {
        Some(tag) => PostFilter::published().tagged(tag),
        None => PostFilter::published(),
    };

    let count = queries::count_posts(&state.db, filter).await?;
    let page = Paginator::new(count, POSTS_PER_PAGE).page(raw_page);
    let posts = queries::list_posts(&state.db, filter, Some(page)).await?;

    let base_path = match &tag {
        Some(tag) => format!("/blog/tag/{}/", tag.slug),
        None => "/blog/".to_string(),
    };

    let template = PostListTemplate {
        layout: Layout::load(state).await?,
        posts: post_cards(&state.db, &posts).await?,
        tag,
        page,
        base_path,
    };
    Ok(Html(template.render()?))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    render_list(&state, None, query.page.as_deref()).await
}

async fn list_posts_by_tag(
    State(state): State<AppState>,
    Path(tag_slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let Some(tag) = queries::tag_by_slug(&state.db, &tag_slug).await? else {
        return Err(AppError::NotFound);
    };
    render_list(&state, Some(tag), query.page.as_deref()).await
}

async fn post_detail(
    State(state): State<AppState>,
    Path((year, month, day, slug)): Path<(String, String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let Some(post) = queries::published_post_by_segments(&state.db, &year, &month, &day, &slug).await? else {
        return Err(AppError::NotFound);
    };

    let tags = queries::tags_for_post(&state.db, post.id).await?;
    let comments = queries::active_comments(&state.db, post.id).await?;
    let similar = queries::similar_posts(&state.db, &post).await?;

    let template = PostDetailTemplate {
        layout: Layout::load(&state).await?,
        post: PostCard::new(&post, tags),
        post_id: post.id,
        comments: CommentView::list(&comments),
        similar: similar.iter().map(PostLink::from).collect(),
        form: CommentForm::default(),
        errors: FormErrors::new(),
    };
    Ok(Html(template.render()?))
}

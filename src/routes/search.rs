use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::forms::SearchForm;
use crate::queries;
use crate::routes::views::{post_cards, Layout, PostCard};
use crate::search::Strategy;
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/search.html")]
struct SearchTemplate {
    layout: Layout,
    query: String,
    searched: bool,
    results: Vec<PostCard>,
    action: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog/search/", get(post_search))
        .route("/blog/search/simple/", get(simple_search))
}

async fn render_search(
    state: &AppState,
    form: SearchForm,
    strategy: Strategy,
    action: &'static str,
) -> Result<Html<String>, AppError> {
    let results = match form.query() {
        Some(query) => {
            let posts = queries::search_posts(&state.db, query, strategy).await?;
            tracing::debug!(query, results = posts.len(), "post search");
            post_cards(&state.db, &posts).await?
        }
        None => Vec::new(),
    };

    let template = SearchTemplate {
        layout: Layout::load(state).await?,
        query: form.query().unwrap_or_default().to_string(),
        searched: form.query().is_some(),
        results,
        action,
    };
    Ok(Html(template.render()?))
}

async fn post_search(
    State(state): State<AppState>,
    Query(form): Query<SearchForm>,
) -> Result<impl IntoResponse, AppError> {
    render_search(&state, form, Strategy::default(), "/blog/search/").await
}

/// Substring match on titles, for when fuzzy matching is not wanted.
async fn simple_search(
    State(state): State<AppState>,
    Query(form): Query<SearchForm>,
) -> Result<impl IntoResponse, AppError> {
    render_search(&state, form, Strategy::Contains, "/blog/search/simple/").await
}

use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::markdown;
use crate::queries::{self, PostFilter};
use crate::AppState;

const FEED_ITEMS: i64 = 5;
const FEED_DESCRIPTION_WORDS: usize = 30;

struct FeedItem {
    title: String,
    link: String,
    description: String,
    pub_date: String,
}

#[derive(Template)]
#[template(path = "feed.xml")]
struct FeedTemplate {
    title: String,
    link: String,
    description: String,
    items: Vec<FeedItem>,
}

struct SitemapEntry {
    loc: String,
    lastmod: String,
}

#[derive(Template)]
#[template(path = "sitemap.xml")]
struct SitemapTemplate {
    entries: Vec<SitemapEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog/feed/", get(post_feed))
        .route("/sitemap.xml", get(sitemap))
}

/// RSS 2.0 feed of the latest published posts.
async fn post_feed(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = queries::latest_posts(&state.db, FEED_ITEMS).await?;

    let items = posts
        .iter()
        .map(|post| FeedItem {
            title: post.title.clone(),
            link: state.config.absolute_url(&post.absolute_url()),
            description: markdown::excerpt(&post.body, FEED_DESCRIPTION_WORDS),
            pub_date: post.publish.to_rfc2822(),
        })
        .collect();

    let template = FeedTemplate {
        title: state.config.site_name.clone(),
        link: state.config.absolute_url("/blog/"),
        description: format!("New posts of {}", state.config.site_name),
        items,
    };

    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        template.render()?,
    ))
}

async fn sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = queries::list_posts(&state.db, PostFilter::published(), None).await?;

    let entries = posts
        .iter()
        .map(|post| SitemapEntry {
            loc: state.config.absolute_url(&post.absolute_url()),
            lastmod: post.updated_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let template = SitemapTemplate { entries };
    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        template.render()?,
    ))
}

//! Presentation structs shared by the HTML templates.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::markdown;
use crate::models::{Comment, Post, Tag};
use crate::queries::{self, PostFilter};
use crate::AppState;

const LATEST_IN_SIDEBAR: i64 = 5;
const EXCERPT_WORDS: usize = 30;

/// Data every page's base layout needs.
pub struct Layout {
    pub site_name: String,
    pub total_posts: i64,
    pub latest: Vec<PostLink>,
    pub static_hash: &'static str,
}

impl Layout {
    pub async fn load(state: &AppState) -> Result<Self, AppError> {
        let total_posts = queries::count_posts(&state.db, PostFilter::published()).await?;
        let latest = queries::latest_posts(&state.db, LATEST_IN_SIDEBAR).await?;
        Ok(Self {
            site_name: state.config.site_name.clone(),
            total_posts,
            latest: latest.iter().map(PostLink::from).collect(),
            static_hash: crate::STATIC_HASH,
        })
    }
}

pub struct PostLink {
    pub title: String,
    pub url: String,
}

impl From<&Post> for PostLink {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            url: post.absolute_url(),
        }
    }
}

pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub author: String,
    pub published_on: String,
    pub excerpt: String,
    pub body_html: String,
    pub tags: Vec<Tag>,
}

impl PostCard {
    pub fn new(post: &Post, tags: Vec<Tag>) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            url: post.absolute_url(),
            author: post.author.clone(),
            published_on: post.publish.format("%B %-d, %Y").to_string(),
            excerpt: markdown::excerpt(&post.body, EXCERPT_WORDS),
            body_html: markdown::render(&post.body),
            tags,
        }
    }
}

pub async fn post_cards(db: &SqlitePool, posts: &[Post]) -> Result<Vec<PostCard>, AppError> {
    let mut cards = Vec::with_capacity(posts.len());
    for post in posts {
        let tags = queries::tags_for_post(db, post.id).await?;
        cards.push(PostCard::new(post, tags));
    }
    Ok(cards)
}

pub struct CommentView {
    pub number: usize,
    pub name: String,
    pub created: String,
    pub body: String,
}

impl CommentView {
    pub fn list(comments: &[Comment]) -> Vec<Self> {
        comments
            .iter()
            .enumerate()
            .map(|(i, c)| Self {
                number: i + 1,
                name: c.name.clone(),
                created: c.created_at.format("%B %-d, %Y %H:%M").to_string(),
                body: c.body.clone(),
            })
            .collect()
    }
}

//! Read side of the content store.
//!
//! Public callers always start from [`PostFilter::published`]; there is no
//! implicit default filter, so the published-only rule is visible wherever a
//! listing is built.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::models::{Comment, Post, Status, Tag};
use crate::pagination::PageInfo;
use crate::search::{self, Strategy};

pub const POST_SELECT: &str =
    "SELECT p.*, u.username AS author FROM posts p JOIN users u ON u.id = p.author_id";

const POST_ORDER: &str = " ORDER BY p.publish DESC, p.id ASC";

pub const SIMILAR_POSTS_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    status: Status,
    tag_id: Option<i64>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            status: Status::Published,
            tag_id: None,
        }
    }

    pub fn tagged(self, tag: &Tag) -> Self {
        Self {
            tag_id: Some(tag.id),
            ..self
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE p.status = ").push_bind(self.status);
        if let Some(tag_id) = self.tag_id {
            qb.push(" AND p.id IN (SELECT post_id FROM post_tags WHERE tag_id = ")
                .push_bind(tag_id)
                .push(")");
        }
    }
}

pub async fn count_posts(db: &SqlitePool, filter: PostFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
    filter.push_where(&mut qb);
    let (count,): (i64,) = qb.build_query_as().fetch_one(db).await?;
    Ok(count)
}

/// Posts matching `filter`, newest first; the whole set when `page` is `None`.
pub async fn list_posts(
    db: &SqlitePool,
    filter: PostFilter,
    page: Option<PageInfo>,
) -> Result<Vec<Post>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
    filter.push_where(&mut qb);
    qb.push(POST_ORDER);
    if let Some(page) = page {
        qb.push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
    }
    qb.build_query_as::<Post>().fetch_all(db).await
}

pub async fn latest_posts(db: &SqlitePool, count: i64) -> Result<Vec<Post>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
    PostFilter::published().push_where(&mut qb);
    qb.push(POST_ORDER).push(" LIMIT ").push_bind(count);
    qb.build_query_as::<Post>().fetch_all(db).await
}

/// UTC bounds `[start, end)` of a calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Published post by its date-scoped URL. An impossible date yields `None`.
pub async fn published_post_by_date(
    db: &SqlitePool,
    year: i32,
    month: u32,
    day: u32,
    slug: &str,
) -> Result<Option<Post>, sqlx::Error> {
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return Ok(None);
    };
    let (start, end) = day_bounds(date);

    sqlx::query_as(&format!(
        "{POST_SELECT} WHERE p.status = ? AND p.slug = ? AND p.publish >= ? AND p.publish < ?"
    ))
    .bind(Status::Published)
    .bind(slug)
    .bind(start)
    .bind(end)
    .fetch_optional(db)
    .await
}

/// Same lookup from raw URL segments; segments that do not parse as a date find nothing.
pub async fn published_post_by_segments(
    db: &SqlitePool,
    year: &str,
    month: &str,
    day: &str,
    slug: &str,
) -> Result<Option<Post>, sqlx::Error> {
    let (Ok(year), Ok(month), Ok(day)) = (year.parse(), month.parse(), day.parse()) else {
        return Ok(None);
    };
    published_post_by_date(db, year, month, day, slug).await
}

pub async fn published_post_by_id(db: &SqlitePool, id: i64) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as(&format!("{POST_SELECT} WHERE p.status = ? AND p.id = ?"))
        .bind(Status::Published)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn tag_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(db)
        .await
}

pub async fn tags_for_post(db: &SqlitePool, post_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as(
        "SELECT t.* FROM tags t JOIN post_tags pt ON pt.tag_id = t.id WHERE pt.post_id = ? ORDER BY t.name",
    )
    .bind(post_id)
    .fetch_all(db)
    .await
}

pub async fn active_comments(db: &SqlitePool, post_id: i64) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM comments WHERE post_id = ? AND active = 1 ORDER BY created_at, id",
    )
    .bind(post_id)
    .fetch_all(db)
    .await
}

#[derive(Debug, FromRow)]
pub struct SimilarCandidate {
    #[sqlx(flatten)]
    pub post: Post,
    pub shared_tags: i64,
}

/// Order candidates by shared tag count, then recency, and keep the first `limit`.
pub fn rank_similar(mut candidates: Vec<SimilarCandidate>, limit: usize) -> Vec<Post> {
    candidates.sort_by(|a, b| {
        b.shared_tags
            .cmp(&a.shared_tags)
            .then(b.post.publish.cmp(&a.post.publish))
            .then(a.post.id.cmp(&b.post.id))
    });
    candidates.into_iter().take(limit).map(|c| c.post).collect()
}

/// Other published posts sharing at least one tag with `post`.
pub async fn similar_posts(db: &SqlitePool, post: &Post) -> Result<Vec<Post>, sqlx::Error> {
    let candidates: Vec<SimilarCandidate> = sqlx::query_as(
        r#"
        SELECT p.*, u.username AS author, COUNT(pt.tag_id) AS shared_tags
        FROM posts p
        JOIN users u ON u.id = p.author_id
        JOIN post_tags pt ON pt.post_id = p.id
        WHERE p.status = ?
          AND p.id != ?
          AND pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = ?)
        GROUP BY p.id
        "#,
    )
    .bind(Status::Published)
    .bind(post.id)
    .bind(post.id)
    .fetch_all(db)
    .await?;

    Ok(rank_similar(candidates, SIMILAR_POSTS_LIMIT))
}

/// Published posts whose title matches `query`. A blank query returns nothing.
pub async fn search_posts(
    db: &SqlitePool,
    query: &str,
    strategy: Strategy,
) -> Result<Vec<Post>, sqlx::Error> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let posts = list_posts(db, PostFilter::published(), None).await?;
    Ok(search::rank(posts, query, strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candidate(id: i64, day: u32, shared_tags: i64) -> SimilarCandidate {
        let publish = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        SimilarCandidate {
            post: Post {
                id,
                title: format!("Post {id}"),
                slug: format!("post-{id}"),
                author_id: 1,
                author: "admin".into(),
                body: String::new(),
                publish,
                created_at: publish,
                updated_at: publish,
                status: Status::Published,
            },
            shared_tags,
        }
    }

    #[test]
    fn similar_ranking_prefers_shared_tags_then_recency() {
        let ranked = rank_similar(
            vec![candidate(1, 1, 1), candidate(2, 3, 2), candidate(3, 5, 1), candidate(4, 2, 2)],
            SIMILAR_POSTS_LIMIT,
        );
        let ids: Vec<i64> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn similar_ranking_truncates() {
        let ranked = rank_similar((1..=6).map(|i| candidate(i, i as u32, 1)).collect(), 4);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].id, 6);
    }

    #[test]
    fn day_bounds_cover_one_day() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }
}

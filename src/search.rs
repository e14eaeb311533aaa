//! Title search over published posts.
//!
//! Similarity follows the trigram model used by database text-search
//! extensions: each word is lowercased, padded with two leading spaces and one
//! trailing space, and split into every three-character window. The score of two
//! strings is the size of the shared trigram set over the size of the union.

use std::collections::HashSet;

use crate::models::Post;

pub const SIMILARITY_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Keep titles scoring strictly above `threshold`, best match first.
    Trigram { threshold: f64 },
    /// Case-insensitive substring match, default ordering kept.
    Contains,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Trigram {
            threshold: SIMILARITY_THRESHOLD,
        }
    }
}

pub fn trigrams(text: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(" ".chars())
            .collect();
        for window in padded.windows(3) {
            set.insert(window.iter().collect());
        }
    }
    set
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;
    shared as f64 / union as f64
}

/// Filter and rank `posts` (already in default order) against `query`.
///
/// A blank query matches nothing.
pub fn rank(posts: Vec<Post>, query: &str, strategy: Strategy) -> Vec<Post> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    match strategy {
        Strategy::Trigram { threshold } => {
            let mut scored: Vec<(f64, Post)> = posts
                .into_iter()
                .map(|post| (similarity(&post.title, query), post))
                .filter(|(score, _)| *score > threshold)
                .collect();
            // stable: equal scores keep publish order
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.into_iter().map(|(_, post)| post).collect()
        }
        Strategy::Contains => {
            let needle = query.to_lowercase();
            posts
                .into_iter()
                .filter(|post| post.title.to_lowercase().contains(&needle))
                .collect()
        }
    }
}

pub mod comment;
pub mod image;
pub mod post;
pub mod tag;
pub mod user;

pub use comment::Comment;
pub use image::Image;
pub use post::{Post, Status, slugify};
pub use tag::Tag;
pub use user::User;

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to whole seconds, the precision every timestamp is stored at.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

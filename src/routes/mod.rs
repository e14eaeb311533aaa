pub mod api;
pub mod auth;
pub mod blog;
pub mod comments;
pub mod feeds;
pub mod images;
pub mod search;
pub mod share;
pub mod views;

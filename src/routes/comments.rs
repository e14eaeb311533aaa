use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::post,
    Form, Router,
};

use crate::authoring;
use crate::error::AppError;
use crate::forms::{CommentForm, FormErrors};
use crate::models::Comment;
use crate::queries;
use crate::routes::views::{Layout, PostLink};
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/comment.html")]
struct CommentTemplate {
    layout: Layout,
    post: PostLink,
    post_id: i64,
    comment: Option<Comment>,
    form: CommentForm,
    errors: FormErrors,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/blog/{id}/comment/", post(post_comment))
}

async fn post_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<impl IntoResponse, AppError> {
    let Some(post) = queries::published_post_by_id(&state.db, post_id).await? else {
        return Err(AppError::NotFound);
    };

    let (comment, form, errors) = match authoring::create_comment(&state.db, post.id, &form).await {
        Ok(comment) => (Some(comment), CommentForm::default(), FormErrors::new()),
        Err(AppError::Validation(errors)) => (None, form, errors),
        Err(e) => return Err(e),
    };

    let template = CommentTemplate {
        layout: Layout::load(&state).await?,
        post: PostLink::from(&post),
        post_id: post.id,
        comment,
        form,
        errors,
    };
    Ok(Html(template.render()?))
}

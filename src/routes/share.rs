use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
    routing::get,
    Form, Router,
};

use crate::error::AppError;
use crate::forms::{FormErrors, ShareForm};
use crate::mail;
use crate::models::Post;
use crate::queries;
use crate::routes::views::{Layout, PostLink};
use crate::AppState;

#[derive(Template)]
#[template(path = "posts/share.html")]
struct ShareTemplate {
    layout: Layout,
    post: PostLink,
    post_id: i64,
    form: ShareForm,
    errors: FormErrors,
    sent: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/blog/{id}/share/", get(share_form).post(share_post))
}

/// Validate the form and mail the recommendation. Transport failures are
/// returned to the caller as-is.
pub(crate) async fn send_share(state: &AppState, post: &Post, form: &ShareForm) -> Result<(), AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        tracing::debug!(post_id = post.id, "share form rejected");
        return Err(AppError::Validation(errors));
    }

    let post_url = state.config.absolute_url(&post.absolute_url());
    let message = mail::share_message(form, &post.title, &post_url, &state.config.smtp.from);

    match state.mailer.send(message).await {
        Ok(()) => {
            tracing::info!(post_id = post.id, "share email sent");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(post_id = post.id, "share email failed: {e}");
            Err(e.into())
        }
    }
}

async fn load_post(state: &AppState, post_id: i64) -> Result<Post, AppError> {
    queries::published_post_by_id(&state.db, post_id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn share_form(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = load_post(&state, post_id).await?;
    let template = ShareTemplate {
        layout: Layout::load(&state).await?,
        post: PostLink::from(&post),
        post_id: post.id,
        form: ShareForm::default(),
        errors: FormErrors::new(),
        sent: false,
    };
    Ok(Html(template.render()?))
}

async fn share_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Form(form): Form<ShareForm>,
) -> Result<impl IntoResponse, AppError> {
    let post = load_post(&state, post_id).await?;

    let (sent, errors) = match send_share(&state, &post, &form).await {
        Ok(()) => (true, FormErrors::new()),
        Err(AppError::Validation(errors)) => (false, errors),
        Err(e) => return Err(e),
    };

    let template = ShareTemplate {
        layout: Layout::load(&state).await?,
        post: PostLink::from(&post),
        post_id: post.id,
        form,
        errors,
        sent,
    };
    Ok(Html(template.render()?))
}

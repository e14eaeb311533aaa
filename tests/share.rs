mod common;

use axum::http::StatusCode;
use common::{body_string, march, TestApp};
use thoughts::models::Status;

const SHARE_BODY: &str =
    "name=Ann&your_email=ann%40example.com&to_whom=bob%40example.com&comments=Worth+a+look";

#[tokio::test]
async fn share_form_renders() {
    let app = TestApp::new().await;
    let author = app.create_user("admin").await;
    let post = app.create_post(author, "Shareable", Status::Published, march(7), &[]).await;

    let resp = app.get(&format!("/blog/{}/share/", post.id), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("name=\"to_whom\""));
}

#[tokio::test]
async fn share_sends_one_message() {
    let app = TestApp::new().await;
    let author = app.create_user("admin").await;
    let post = app.create_post(author, "Shareable", Status::Published, march(7), &[]).await;

    let resp = app.post_form(&format!("/blog/{}/share/", post.id), SHARE_BODY).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("E-mail successfully sent"));

    let sent = app.sent_mail();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "bob@example.com");
    assert_eq!(sent[0].subject, "Ann recommends you read \"Shareable\"");
    assert_eq!(
        sent[0].body,
        "Read \"Shareable\" at http://testserver/blog/2024/3/7/shareable/\n\n\
         Ann's (ann@example.com) comments: Worth a look"
    );
}

#[tokio::test]
async fn invalid_share_sends_nothing() {
    let app = TestApp::new().await;
    let author = app.create_user("admin").await;
    let post = app.create_post(author, "Shareable", Status::Published, march(7), &[]).await;

    let resp = app
        .post_form(
            &format!("/blog/{}/share/", post.id),
            "name=Ann&your_email=ann%40example.com&to_whom=bob",
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Enter a valid email address"));
    assert!(app.sent_mail().is_empty());
}

#[tokio::test]
async fn transport_failure_is_a_server_error() {
    let app = TestApp::with_failing_mailer().await;
    let author = app.create_user("admin").await;
    let post = app.create_post(author, "Shareable", Status::Published, march(7), &[]).await;

    let resp = app.post_form(&format!("/blog/{}/share/", post.id), SHARE_BODY).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(resp).await.contains("connection refused"));
}

#[tokio::test]
async fn share_of_draft_is_not_found() {
    let app = TestApp::new().await;
    let author = app.create_user("admin").await;
    let draft = app.create_post(author, "Unlisted", Status::Draft, march(7), &[]).await;

    let resp = app.get(&format!("/blog/{}/share/", draft.id), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

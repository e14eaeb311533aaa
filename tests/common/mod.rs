#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use thoughts::config::Config;
use thoughts::forms::PostForm;
use thoughts::mail::{MailError, Mailer, OutgoingMail};
use thoughts::media::FsMediaStore;
use thoughts::models::{Post, Status};
use thoughts::{AppState, authoring, build_app, cli};

pub const PASSWORD: &str = "s3cret-pass";

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
    pub media_root: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::build(mailer.clone(), mailer).await
    }

    /// App whose mail transport rejects every message.
    pub async fn with_failing_mailer() -> Self {
        Self::build(Arc::new(FailingMailer), Arc::new(RecordingMailer::default())).await
    }

    async fn build(transport: Arc<dyn Mailer>, mailer: Arc<RecordingMailer>) -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to create in-memory SQLite pool");

        thoughts::db::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        let media_root = std::env::temp_dir().join(format!("thoughts-test-{}", uuid::Uuid::new_v4()));
        let config = Config {
            jwt_secret: "test-secret".to_string(),
            site_url: "http://testserver".to_string(),
            media_root: media_root.clone(),
            ..Config::default()
        };

        let state = AppState::new(
            pool.clone(),
            config,
            transport,
            Arc::new(FsMediaStore::new(media_root.clone())),
        );

        Self {
            router: build_app(state),
            db: pool,
            mailer,
            media_root,
        }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Create an active user with [`PASSWORD`] and return its id.
    pub async fn create_user(&self, username: &str) -> i64 {
        cli::create_user(&self.db, username, PASSWORD, None)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Create a post directly through the authoring layer.
    pub async fn create_post(
        &self,
        author_id: i64,
        title: &str,
        status: Status,
        publish: DateTime<Utc>,
        tags: &[&str],
    ) -> Post {
        let form = PostForm {
            title: title.to_string(),
            body: format!("Body of {title}."),
            status: Some(status),
            publish: Some(publish),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..PostForm::default()
        };
        authoring::create_post(&self.db, author_id, &form)
            .await
            .expect("Failed to create test post")
    }

    /// Obtain an access token for `username` through the API.
    pub async fn token(&self, username: &str) -> String {
        let resp = self
            .post_json(
                "/api/token/",
                serde_json::json!({ "username": username, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        body["access"].as_str().unwrap().to_string()
    }

    fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().uri(uri).method(method);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
    }

    /// Send a GET request with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("GET", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request.
    pub async fn post_form(&self, uri: &str, body: &str) -> Response {
        let req = Self::builder("POST", uri, None)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value, token: Option<&str>) -> Response {
        self.send_json("POST", uri, body, token).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value, token: Option<&str>) -> Response {
        self.send_json("PUT", uri, body, token).await
    }

    async fn send_json(&self, method: &str, uri: &str, body: serde_json::Value, token: Option<&str>) -> Response {
        let req = Self::builder(method, uri, token)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    /// Upload a file to the image endpoint as `multipart/form-data`.
    pub async fn upload_image(&self, title: &str, filename: &str, bytes: &[u8], token: &str) -> Response {
        let boundary = "thoughts-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let req = Self::builder("POST", "/api/images/", Some(token))
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional bearer token.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        let req = Self::builder("DELETE", uri, token).body(Body::empty()).unwrap();
        self.request(req).await
    }

    pub async fn comment_count(&self, post_id: i64) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.db)
            .await
            .unwrap();
        count
    }

    pub fn sent_mail(&self) -> Vec<OutgoingMail> {
        self.mailer.sent.lock().unwrap().clone()
    }
}

/// Noon UTC on the given day of March 2024.
pub fn march(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

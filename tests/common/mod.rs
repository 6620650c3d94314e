#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use khateraty::auth::{self, AuthProvider, Mailer, MemoryMailer, SignUpMetadata};
use khateraty::config::Config;
use khateraty::db::models::{Category, NewPost, Post, ProfileSeed};
use khateraty::db::{self, Repository};
use khateraty::routes;
use khateraty::state::{AppState, DbPool};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

pub const PASSWORD: &str = "secret1";

/// A full app on a throwaway database.
pub struct TestApp {
    _dir: TempDir,
    pool: DbPool,
    pub state: AppState,
    pub mailer: Arc<MemoryMailer>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_owners(Vec::new())
    }

    pub fn with_owners(owner_emails: Vec<String>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.resolve_paths(dir.path());
        config.auth.hash_cost = 4;
        config.auth.owner_emails = owner_emails;

        let pool = db::open(&config.db_path()).expect("Failed to open test database");
        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(config, pool.clone(), mailer.clone() as Arc<dyn Mailer>);
        auth::spawn_listener(state.auth.subscribe(), state.auth_state.clone());

        TestApp {
            router: routes::app(state.clone()),
            _dir: dir,
            pool,
            state,
            mailer,
        }
    }

    /// Direct database access for checks the repository does not expose.
    pub fn conn(&self) -> PooledConnection<SqliteConnectionManager> {
        self.pool.get().unwrap()
    }

    pub fn repo(&self) -> &dyn Repository {
        self.state.repo.as_ref()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        self.post_multipart_file(uri, cookie, fields, None).await
    }

    /// Multipart form with an optional `(field, file name, content type, bytes)` part.
    pub async fn post_multipart_file(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &str, &[u8])>,
    ) -> Response<Body> {
        let boundary = "khateraty-test-boundary";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// A confirmed user with a completed profile, signed in.
    /// Returns the user id and a `Cookie` header value.
    pub async fn member(&self, email: &str, name: &str) -> (String, String) {
        let provider: &dyn AuthProvider = self.state.auth.as_ref();
        let user = provider
            .sign_up(
                email,
                PASSWORD,
                SignUpMetadata {
                    full_name: Some(name.to_string()),
                },
            )
            .await
            .unwrap();
        let code = confirmation_code(&self.mailer, email).await;
        provider.exchange_code_for_session(&code).await.unwrap();

        let repo = self.repo();
        repo.upsert_profile(&ProfileSeed {
            id: user.id.clone(),
            email: email.to_string(),
            full_name: Some(name.to_string()),
            avatar_url: None,
            is_owner: self.state.config.auth.is_owner_email(email),
        })
        .await
        .unwrap();
        repo.complete_profile(&user.id, name, "01012345678", None)
            .await
            .unwrap();

        let session = provider.sign_in(email, PASSWORD).await.unwrap();
        (user.id, self.cookie(&session.access_token))
    }

    pub fn cookie(&self, token: &str) -> String {
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub async fn publish(&self, user_id: &str, content: &str, category: Option<Category>) -> Post {
        self.repo()
            .insert_post(&NewPost {
                user_id: user_id.to_string(),
                content: content.to_string(),
                category,
                image_url: None,
            })
            .await
            .unwrap()
    }
}

/// Pull the one-time code out of the last link mailed to `email`.
pub async fn confirmation_code(mailer: &MemoryMailer, email: &str) -> String {
    let link = mailer
        .last_link_for(email)
        .await
        .expect("No mail sent to this address");
    let url = url::Url::parse(&link).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .expect("Link has no code")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// The `name=value` pair of the first cookie called `name`.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{name}=")))
        .and_then(|c| c.split(';').next().map(str::to_string))
}

pub fn is_redirect(response: &Response<Body>) -> bool {
    response.status() == StatusCode::SEE_OTHER
}

pub fn card_count(html: &str) -> usize {
    html.matches("class=\"card post-card\"").count()
}

//! HTTP surface.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check (no principal needed)
//! - `GET|POST /api/documents`, `GET|PUT|DELETE /api/documents/{id}`
//! - `GET|POST /api/roles`, `GET|PUT|DELETE /api/roles/{id}`
//! - `POST /api/users`, `POST /api/users/login`, `POST /api/users/logout`,
//!   `GET /api/users/me`
//!
//! Every `/api` route runs behind [`auth::principal_middleware`], which turns
//! the `x-auth-token` header into a `Principal` (anonymous when absent).

mod auth;
mod documents;
mod extract;
mod roles;
mod users;

pub use auth::AUTH_HEADER;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::DocumentCache;
use crate::config::Config;
use crate::db::{DocumentRepository, RoleRepository, UserRepository};
use crate::identity::IdentityStore;
use crate::service::{DocumentService, RoleService, UserService};
use crate::tokens::TokenStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    pub roles: Arc<RoleService>,
    pub users: Arc<UserService>,
    pub identity: Arc<IdentityStore>,
    pub cache: Arc<dyn DocumentCache>,
}

impl AppState {
    /// Wires the services over one store pool and one cache handle.
    pub fn new(pool: SqlitePool, cache: Arc<dyn DocumentCache>, config: &Config) -> Self {
        let role_repo = RoleRepository::new(pool.clone());
        let identity = Arc::new(IdentityStore::new(
            TokenStore::new(config.token_expiry_minutes),
            role_repo.clone(),
            config.admin_role.clone(),
        ));

        Self {
            documents: Arc::new(DocumentService::new(
                DocumentRepository::new(pool.clone()),
                cache.clone(),
            )),
            roles: Arc::new(RoleService::new(role_repo.clone(), config.admin_role.clone())),
            users: Arc::new(UserService::new(
                UserRepository::new(pool),
                role_repo,
                identity.clone(),
            )),
            identity,
            cache,
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cache: &'static str,
    cache_available: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: state.cache.name(),
        cache_available: state.cache.is_available().await,
    })
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/documents",
            get(documents::list).post(documents::create),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get)
                .put(documents::update)
                .delete(documents::delete),
        )
        .route("/api/roles", get(roles::list).post(roles::create))
        .route(
            "/api/roles/{id}",
            get(roles::get).put(roles::update).delete(roles::delete),
        )
        .route("/api/users", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", post(users::logout))
        .route("/api/users/me", get(users::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::principal_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::test_support::{setup_db, TestDb};
    use crate::models::{AccessMode, Document, PersonName, Role, User};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt as _;
    use uuid::Uuid;

    struct TestApp {
        app: Router,
        state: AppState,
        cache: Arc<MemoryCache>,
        regular: Role,
        admin: Role,
        author: User,
        db: TestDb,
    }

    impl TestApp {
        fn token_for(&self, user_id: Uuid, role_id: Uuid) -> String {
            self.state.identity.issue_token(user_id, role_id)
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            let mut builder = Request::builder().uri(uri);
            if let Some(token) = token {
                builder = builder.header(AUTH_HEADER, token);
            }
            self.send(builder.body(Body::empty()).unwrap()).await
        }

        async fn send_json(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Value,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json");
            if let Some(token) = token {
                builder = builder.header(AUTH_HEADER, token);
            }
            self.send(builder.body(Body::from(body.to_string())).unwrap())
                .await
        }

        async fn seed_document(&self, access: AccessMode) -> Document {
            DocumentRepository::new(self.db.pool.clone())
                .create(
                    &Document::new(format!("{} document", access), self.author.id)
                        .with_content("Document")
                        .with_access(access)
                        .with_role(self.regular.id),
                )
                .await
                .unwrap()
        }
    }

    async fn setup() -> TestApp {
        let db = setup_db().await;
        let roles = RoleRepository::new(db.pool.clone());
        let regular = roles.create(&Role::new("regular")).await.unwrap();
        let admin = roles.create(&Role::new("admin")).await.unwrap();

        let author = UserRepository::new(db.pool.clone())
            .create(&User {
                id: Uuid::new_v4(),
                name: PersonName {
                    first: "nnamdi".into(),
                    last: "lawal".into(),
                },
                email: "66nnamdi@mail.com".into(),
                user_name: "66nnamdi".into(),
                credential_hash: crate::credentials::hash_password("sweetlove").unwrap(),
                role: regular.id,
            })
            .await
            .unwrap();

        let cache = Arc::new(MemoryCache::new(None));
        let state = AppState::new(db.pool.clone(), cache.clone(), &Config::default());

        TestApp {
            app: router(state.clone()),
            state,
            cache,
            regular,
            admin,
            author,
            db,
        }
    }

    fn assert_no_document_fields(body: &Value) {
        assert!(body.get("title").is_none());
        assert!(body.get("_id").is_none());
        assert!(body.get("content").is_none());
        assert!(body.get("ownerId").is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let t = setup().await;

        let (status, body) = t.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"], "memory");
        assert_eq!(body["cache_available"], true);
    }

    #[tokio::test]
    async fn test_missing_document_is_404() {
        let t = setup().await;

        let (status, body) = t
            .get(&format!("/api/documents/{}", Uuid::new_v4()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = t.get("/api/documents/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_public_document_visible_to_anonymous() {
        let t = setup().await;
        let doc = t.seed_document(AccessMode::Public).await;

        let (status, body) = t.get(&format!("/api/documents/{}", doc.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "public document");
        assert_eq!(body["_id"], doc.id.to_string());
    }

    #[tokio::test]
    async fn test_role_document_visible_to_same_role_and_admin() {
        let t = setup().await;
        let doc = t.seed_document(AccessMode::Role).await;
        let uri = format!("/api/documents/{}", doc.id);

        let same_role = t.token_for(Uuid::new_v4(), t.regular.id);
        let (status, body) = t.get(&uri, Some(same_role.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], doc.id.to_string());

        let admin = t.token_for(Uuid::new_v4(), t.admin.id);
        let (status, body) = t.get(&uri, Some(admin.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "role document");
    }

    #[tokio::test]
    async fn test_role_document_hidden_from_other_role() {
        let t = setup().await;
        let doc = t.seed_document(AccessMode::Role).await;

        let other = t.token_for(Uuid::new_v4(), Uuid::new_v4());
        let (status, body) = t
            .get(&format!("/api/documents/{}", doc.id), Some(other.as_str()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_no_document_fields(&body);
    }

    #[tokio::test]
    async fn test_private_document_only_for_author() {
        let t = setup().await;
        let doc = t.seed_document(AccessMode::Private).await;
        let uri = format!("/api/documents/{}", doc.id);

        let author = t.token_for(t.author.id, t.regular.id);
        let (status, body) = t.get(&uri, Some(author.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], doc.id.to_string());

        let admin = t.token_for(Uuid::new_v4(), t.admin.id);
        let (status, body) = t.get(&uri, Some(admin.as_str())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_no_document_fields(&body);

        let (status, body) = t.get(&uri, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_no_document_fields(&body);
    }

    #[tokio::test]
    async fn test_invalid_token_is_401() {
        let t = setup().await;
        let doc = t.seed_document(AccessMode::Public).await;

        let (status, body) = t
            .get(&format!("/api/documents/{}", doc.id), Some("forged-token"))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_no_document_fields(&body);
    }

    #[tokio::test]
    async fn test_create_role_as_admin() {
        let t = setup().await;
        let admin = t.token_for(Uuid::new_v4(), t.admin.id);

        let (status, body) = t
            .send_json("POST", "/api/roles", Some(admin.as_str()), json!({ "title": "premium" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "premium");

        let (_, roles) = t.get("/api/roles", None).await;
        assert_eq!(roles.as_array().unwrap().len(), 3);

        let id = body["_id"].as_str().unwrap();
        let (status, fetched) = t.get(&format!("/api/roles/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "premium");
    }

    #[tokio::test]
    async fn test_create_role_validation() {
        let t = setup().await;
        let admin = t.token_for(Uuid::new_v4(), t.admin.id);

        for body in [json!({ "title": "" }), json!({})] {
            let (status, _) = t.send_json("POST", "/api/roles", Some(admin.as_str()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, body) = t
            .send_json("POST", "/api/roles", Some(admin.as_str()), json!({ "title": "admin" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("title").is_none());
    }

    #[tokio::test]
    async fn test_create_role_requires_admin() {
        let t = setup().await;
        let regular = t.token_for(Uuid::new_v4(), t.regular.id);

        let (status, _) = t
            .send_json("POST", "/api/roles", Some(regular.as_str()), json!({ "title": "premium" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t
            .send_json("POST", "/api/roles", None, json!({ "title": "premium" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_document_lifecycle_keeps_cache_coherent() {
        let t = setup().await;
        let author = t.token_for(t.author.id, t.regular.id);

        let (status, created) = t
            .send_json(
                "POST",
                "/api/documents",
                Some(author.as_str()),
                json!({ "title": "Plans", "content": "v1", "access": "public" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["ownerId"], t.author.id.to_string());
        let id: Uuid = created["_id"].as_str().unwrap().parse().unwrap();
        let uri = format!("/api/documents/{}", id);

        let (status, _) = t.get(&uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(t.cache.exists(id).await.unwrap());

        let (status, updated) = t
            .send_json("PUT", &uri, Some(author.as_str()), json!({ "content": "v2" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["content"], "v2");
        assert!(!t.cache.exists(id).await.unwrap());

        let (_, fetched) = t.get(&uri, None).await;
        assert_eq!(fetched["content"], "v2");

        let stranger = t.token_for(Uuid::new_v4(), t.regular.id);
        let (status, _) = t
            .send_json("PUT", &uri, Some(stranger.as_str()), json!({ "content": "v3" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let delete = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(AUTH_HEADER, &author)
            .body(Body::empty())
            .unwrap();
        let (status, _) = t.send(delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t.get(&uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejected_bodies_use_error_shape() {
        let t = setup().await;
        let admin = t.token_for(Uuid::new_v4(), t.admin.id);

        let (status, body) = t
            .send_json("POST", "/api/roles", Some(admin.as_str()), json!({ "title": 5 }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert!(body.get("title").is_none());

        let no_body = Request::builder()
            .method("POST")
            .uri("/api/roles")
            .header(AUTH_HEADER, &admin)
            .body(Body::empty())
            .unwrap();
        let (status, body) = t.send(no_body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let malformed = Request::builder()
            .method("POST")
            .uri("/api/documents")
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let (status, body) = t.send(malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_anonymous_cannot_create_document() {
        let t = setup().await;

        let (status, _) = t
            .send_json("POST", "/api/documents", None, json!({ "title": "Nope" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_documents_filters_by_principal() {
        let t = setup().await;
        t.seed_document(AccessMode::Public).await;
        t.seed_document(AccessMode::Private).await;
        t.seed_document(AccessMode::Role).await;

        let (_, anonymous) = t.get("/api/documents", None).await;
        assert_eq!(anonymous.as_array().unwrap().len(), 1);

        let author = t.token_for(t.author.id, t.regular.id);
        let (_, own) = t.get("/api/documents", Some(author.as_str())).await;
        assert_eq!(own.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_register_login_me_logout() {
        let t = setup().await;

        let (status, registered) = t
            .send_json(
                "POST",
                "/api/users",
                None,
                json!({
                    "name": { "first": "user1", "last": "solomon" },
                    "email": "user30@mail.com",
                    "userName": "user30",
                    "password": "sweetlove",
                    "role": t.regular.id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(registered["user"].get("credentialHash").is_none());
        assert_eq!(registered["user"]["userName"], "user30");

        let (status, login) = t
            .send_json(
                "POST",
                "/api/users/login",
                None,
                json!({ "email": "user30@mail.com", "password": "sweetlove" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = login["token"].as_str().unwrap().to_string();

        let (status, me) = t.get("/api/users/me", Some(token.as_str())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "user30@mail.com");

        let logout = Request::builder()
            .method("POST")
            .uri("/api/users/logout")
            .header(AUTH_HEADER, &token)
            .body(Body::empty())
            .unwrap();
        let (status, _) = t.send(logout).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = t.get("/api/users/me", Some(token.as_str())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let t = setup().await;

        let (status, body) = t
            .send_json(
                "POST",
                "/api/users/login",
                None,
                json!({ "email": "66nnamdi@mail.com", "password": "wrong-password" }),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("token").is_none());
    }
}

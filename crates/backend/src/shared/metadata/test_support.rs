//! In-process server over an in-memory database for HTTP-level tests

use std::sync::Arc;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use serde_json::Value;
use tokio::net::TcpListener;

use super::discovery::discover;
use super::forms::FormResolver;
use super::permissions::PermissionPolicy;
use super::registry::MetadataRegistry;
use super::templates::TemplateSet;
use super::urls::synthesize;
use super::views::AdminState;
use crate::shared::config::PermissionsConfig;
use crate::shared::data::db::apply_app_schemas;
use crate::system::auth::jwt::JwtKeys;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
/// Read-only access to agents
pub const CAROL: &str = "carol";
/// Carries the admin flag; its profile grants nothing
pub const ROOT: &str = "root";

const PERMISSIONS: &str = r#"
default_profile = "member"

[users]
carol = "auditor"
root = "nobody"

[profiles.member]
agent = { allow_read = true, allow_edit = true }
knowledge_base = { allow_read = true, allow_edit = true }
data_source = { allow_read = true, allow_edit = true }
prompt = { allow_read = true, allow_edit = true }

[profiles.auditor]
agent = { allow_read = true }
"#;

pub async fn memory_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts).await.unwrap()
}

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub db: DatabaseConnection,
    keys: Arc<JwtKeys>,
}

pub async fn spawn(templates: TemplateSet) -> TestServer {
    let installed: Vec<String> = ["core_agent", "chatbot_app", "home"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let catalog = Arc::new(crate::apps::catalog());
    let mut registry = MetadataRegistry::new();
    discover(&catalog, &installed, &mut registry).unwrap();
    let routes = synthesize(&registry).unwrap();
    let forms = FormResolver::new(catalog.clone());
    forms.check(&registry).unwrap();
    let permissions: PermissionsConfig = toml::from_str(PERMISSIONS).unwrap();

    let db = memory_db().await;
    apply_app_schemas(&db, &catalog.installed(&installed).unwrap())
        .await
        .unwrap();

    let keys = Arc::new(JwtKeys::from_secret("test-secret"));
    let state = AdminState {
        registry: Arc::new(registry),
        routes: Arc::new(routes),
        db: db.clone(),
        templates: Arc::new(templates),
        forms,
        permissions: Arc::new(PermissionPolicy::new(permissions)),
        keys: keys.clone(),
    };
    let app = crate::routes::configure_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        db,
        keys,
    }
}

impl TestServer {
    pub fn token(&self, user: &str) -> String {
        self.keys.generate_access_token(user, user, user == ROOT).unwrap()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn exec(&self, sql: &str) {
        self.db.execute_unprepared(sql).await.unwrap();
    }

    pub async fn get_json(&self, path: &str, user: &str) -> (u16, Value) {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(self.token(user))
            .header("Accept", "application/json")
            .send()
            .await
            .unwrap();
        (res.status().as_u16(), res.json().await.unwrap())
    }

    pub async fn post_json(&self, path: &str, user: &str, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(self.token(user))
            .json(&body)
            .send()
            .await
            .unwrap();
        (res.status().as_u16(), res.json().await.unwrap())
    }
}

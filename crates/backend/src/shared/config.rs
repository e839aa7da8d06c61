use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub apps: AppsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// HMAC secret for access tokens; generated at startup when empty
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppsConfig {
    /// Application packages scanned for metadata declarations
    pub installed: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplatesConfig {
    pub dir: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: "templates".to_string(),
        }
    }
}

/// Profile-based access to entity types for non-admin users.
/// Without a matching grant a user sees nothing.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PermissionsConfig {
    /// Profile for users without an entry in `users`
    #[serde(default)]
    pub default_profile: Option<String>,
    /// User id -> profile name
    #[serde(default)]
    pub users: HashMap<String, String>,
    /// Profile name -> snake_case entity name -> grant
    #[serde(default)]
    pub profiles: HashMap<String, HashMap<String, EntityGrant>>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityGrant {
    #[serde(default)]
    pub allow_read: bool,
    #[serde(default)]
    pub allow_edit: bool,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[database]
path = "target/db/app.db"

[auth]
jwt_secret = ""

[apps]
installed = ["core_agent", "chatbot_app", "home"]

[templates]
dir = "templates"

[permissions]
default_profile = "member"

[permissions.profiles.member]
agent = { allow_read = true, allow_edit = true }
knowledge_base = { allow_read = true, allow_edit = true }
data_source = { allow_read = true, allow_edit = true }
prompt = { allow_read = true, allow_edit = true }
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. The current working directory
/// 3. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    for config_path in candidate_paths() {
        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            return parse_config(&contents);
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("config.toml"));
        }
    }
    paths.push(PathBuf::from("config.toml"));
    paths
}

/// Resolve a configured path; relative paths are taken from the executable directory
pub fn resolve_path(configured: &str) -> PathBuf {
    let path = Path::new(configured);

    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }

    PathBuf::from(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.apps.installed,
            vec!["core_agent", "chatbot_app", "home"]
        );
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.permissions.default_profile.as_deref(), Some("member"));
        assert_eq!(
            config.permissions.profiles["member"]["data_source"],
            EntityGrant {
                allow_read: true,
                allow_edit: true
            }
        );
    }

    #[test]
    fn test_permission_grants_default_to_denied() {
        let config = parse_config(
            r#"
            [database]
            path = "admin.db"

            [apps]
            installed = []

            [permissions.users]
            carol = "auditor"

            [permissions.profiles.auditor]
            agent = { allow_read = true }
            "#,
        )
        .unwrap();
        assert_eq!(config.permissions.users["carol"], "auditor");
        assert_eq!(config.permissions.default_profile, None);
        let grant = config.permissions.profiles["auditor"]["agent"];
        assert!(grant.allow_read);
        assert!(!grant.allow_edit);
    }

    #[test]
    fn test_optional_sections_default() {
        let config = parse_config(
            r#"
            [database]
            path = "/tmp/admin.db"

            [apps]
            installed = ["core_agent"]
            "#,
        )
        .unwrap();
        assert_eq!(config.templates.dir, "templates");
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.permissions.profiles.is_empty());
        assert_eq!(resolve_path("/tmp/admin.db"), PathBuf::from("/tmp/admin.db"));
    }
}

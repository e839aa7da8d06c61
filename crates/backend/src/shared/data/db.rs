use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use crate::shared::metadata::discovery::InstalledApp;

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<DatabaseConnection> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", normalized);
    let conn = Database::connect(&db_url).await?;
    conn.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Ok(conn)
}

/// Run the idempotent DDL of every installed app
pub async fn apply_app_schemas<C: ConnectionTrait>(
    conn: &C,
    apps: &[&InstalledApp],
) -> anyhow::Result<()> {
    for app in apps {
        for statement in app.schema {
            conn.execute_unprepared(statement).await.map_err(|e| {
                anyhow::anyhow!("schema of app '{}' failed: {}", app.label, e)
            })?;
        }
        if !app.schema.is_empty() {
            tracing::debug!("Applied {} schema statements for {}", app.schema.len(), app.label);
        }
    }
    Ok(())
}

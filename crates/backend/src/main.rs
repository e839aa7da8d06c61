pub mod apps;
pub mod routes;
pub mod shared;
pub mod system;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::middleware;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use shared::metadata::discovery::discover;
use shared::metadata::forms::FormResolver;
use shared::metadata::permissions::PermissionPolicy;
use shared::metadata::registry::MetadataRegistry;
use shared::metadata::templates::TemplateSet;
use shared::metadata::urls::{synthesize, GeneratedRoute};
use shared::metadata::views::AdminState;
use system::auth::jwt::JwtKeys;

#[derive(Parser)]
#[command(name = "backend")]
#[command(about = "Metadata-driven admin server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Print the generated route table and exit
    ShowUrls {
        /// Only routes whose pattern, name or entity contains this text
        filter: Option<String>,
    },
    /// Print a bearer token for a user id and exit
    IssueToken {
        user_id: String,
        #[arg(long, default_value = "operator")]
        username: String,
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    system::tracing::initialize()?;

    let config = shared::config::load_config()?;

    let catalog = Arc::new(apps::catalog());
    let mut registry = MetadataRegistry::new();
    discover(&catalog, &config.apps.installed, &mut registry)?;
    let generated = synthesize(&registry)?;
    let forms = FormResolver::new(catalog.clone());
    forms.check(&registry)?;
    let permissions = PermissionPolicy::new(config.permissions.clone());
    permissions.check(&registry);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ShowUrls { filter } => {
            print_routes(&generated, filter.as_deref());
            return Ok(());
        }
        Commands::IssueToken {
            user_id,
            username,
            admin,
        } => {
            if config.auth.jwt_secret.trim().is_empty() {
                anyhow::bail!("auth.jwt_secret must be set to issue tokens that outlive this process");
            }
            let keys = JwtKeys::from_config(&config.auth);
            println!("{}", keys.generate_access_token(&user_id, &username, admin)?);
            return Ok(());
        }
        Commands::Serve => {}
    }

    let db = shared::data::db::initialize_database(Some(&config.database.path))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;
    shared::data::db::apply_app_schemas(&db, &catalog.installed(&config.apps.installed)?).await?;

    let templates_dir = PathBuf::from(&config.templates.dir);
    let templates_dir = if templates_dir.is_dir() {
        templates_dir
    } else {
        shared::config::resolve_path(&config.templates.dir)
    };
    let templates = TemplateSet::load(&templates_dir)?;

    let state = AdminState {
        registry: Arc::new(registry),
        routes: Arc::new(generated),
        db,
        templates: Arc::new(templates),
        forms,
        permissions: Arc::new(permissions),
        keys: Arc::new(JwtKeys::from_config(&config.auth)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = routes::configure_routes(state)
        .layer(middleware::from_fn(system::middleware::request_logger))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}

fn print_routes(routes: &[GeneratedRoute], filter: Option<&str>) {
    let matching: Vec<_> = routes
        .iter()
        .filter(|r| {
            filter.map_or(true, |f| {
                r.template.contains(f) || r.name.contains(f) || r.entity.contains(f)
            })
        })
        .collect();

    let width = matching.iter().map(|r| r.template.len()).max().unwrap_or(0);
    for route in &matching {
        println!(
            "{:<width$}  {:<32}  {}",
            route.template,
            route.name,
            route.entity,
            width = width
        );
    }
    if matching.is_empty() {
        println!("No generated routes");
    }
}

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};
use server::{
    CloudinaryConfig, CloudinaryReceipts, LocalReceipts, ReceiptStore, ServerConfig, ServerState,
    TokenSigner,
};
use settings::{Database, Provider};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "trackonomy")]
#[command(about = "Personal finance tracking REST API")]
struct Cli {
    /// Settings file (defaults to `config/trackonomy.toml` when present).
    #[arg(long, env = "TRACKONOMY_CONFIG")]
    config: Option<PathBuf>,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "trackonomy={level},server={level},engine={level},migration={level},tower_http={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_database(&settings.server).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let signer = TokenSigner::new(&settings.auth.jwt_secret, settings.auth.token_ttl_hours)?;

    let request_timeout = Duration::from_secs(settings.server.request_timeout_secs);
    let receipts = receipt_store(&settings.uploads, request_timeout)?;

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(
        ServerState::new(engine, signer, receipts),
        ServerConfig { request_timeout },
        listener,
    )
    .await?;

    Ok(())
}

async fn connect_database(config: &settings::Server) -> Result<DatabaseConnection, BoxError> {
    let url = match &config.database {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
        Database::Postgres(url) => url.clone(),
    };

    let timeout = Duration::from_secs(config.db_connect_timeout_secs);
    let mut options = ConnectOptions::new(url);
    options
        .connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}

fn receipt_store(
    uploads: &settings::Uploads,
    timeout: Duration,
) -> Result<Arc<dyn ReceiptStore>, BoxError> {
    match uploads.provider {
        Provider::Local => {
            tracing::info!("storing receipts in {}", uploads.local_dir.display());
            Ok(Arc::new(LocalReceipts::new(
                uploads.local_dir.clone(),
                &uploads.public_base_url,
            )))
        }
        Provider::Cloudinary => {
            let cloudinary = uploads
                .cloudinary
                .as_ref()
                .ok_or("uploads.provider is cloudinary but [uploads.cloudinary] is missing")?;
            let config = CloudinaryConfig {
                cloud_name: cloudinary.cloud_name.clone(),
                api_key: cloudinary.api_key.clone(),
                api_secret: cloudinary.api_secret.clone(),
                folder: cloudinary.folder.clone(),
            };
            tracing::info!("storing receipts on cloudinary ({})", config.cloud_name);
            Ok(Arc::new(CloudinaryReceipts::new(config, timeout)?))
        }
    }
}

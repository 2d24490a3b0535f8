//! CaseBridge Sync Server
//!
//! Webhook ingress and event bus that keeps helpdesk tickets and cloud
//! support cases in sync.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use casebridge_bus::{DeadLetterSink, EventBus, EventHandler};
use casebridge_core::EventSource;
use casebridge_core::config::{default_database_path, load_config};
use casebridge_core::secrets::{EnvSecretStore, FileSecretStore, SecretCache, SecretStore};
use casebridge_core::tracing_init::init_tracing;

use casebridge_server::auth::BearerAuthenticator;
use casebridge_server::clients::{
    CloudSupportClient, CloudSupportConfig, HelpdeskClient, HelpdeskConfig, SupportCaseApi,
    TicketApi,
};
use casebridge_server::handlers::{CloudToHelpdeskHandler, HelpdeskToCloudHandler};
use casebridge_server::storage::{SqliteDeadLetterSink, SyncDatabase};
use casebridge_server::webhook::{AppState, router};

#[derive(Parser, Debug)]
#[command(name = "casebridge-server")]
#[command(
    version,
    about = "CaseBridge sync server - helpdesk/cloud support-case bridge"
)]
struct Args {
    /// Path to JSON config file.
    #[arg(long, env = "CASEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config).
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file (overrides config).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Helpdesk API base URL (overrides config).
    #[arg(long, env = "CASEBRIDGE_HELPDESK_URL")]
    helpdesk_url: Option<String>,

    /// Cloud support API base URL (overrides config).
    #[arg(long, env = "CASEBRIDGE_CLOUD_URL")]
    cloud_url: Option<String>,

    /// Directory with file-mounted secrets; environment variables when unset.
    #[arg(long, env = "CASEBRIDGE_SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if args.log_json {
        config.server.log_json = true;
    }
    init_tracing("casebridge_server=info", config.server.log_json);

    if let Some(addr) = args.addr {
        config.server.addr = addr.to_string();
    }
    if let Some(path) = args.db_path {
        config.server.database_path = Some(path);
    }
    if let Some(url) = args.helpdesk_url {
        config.upstream.helpdesk_base_url = url;
    }
    if let Some(url) = args.cloud_url {
        config.upstream.cloud_base_url = url;
    }
    if let Some(dir) = args.secrets_dir {
        config.secrets.dir = Some(dir);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        "Starting casebridge-server"
    );

    let db_path = match &config.server.database_path {
        Some(path) => path.clone(),
        None => default_database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine config directory"))?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %db_path.display(), "Opening sync database");
    let db = SyncDatabase::open(&db_path).await?;

    let store: Box<dyn SecretStore> = match &config.secrets.dir {
        Some(dir) => Box::new(FileSecretStore::new(dir.clone())),
        None => Box::new(EnvSecretStore),
    };
    let secrets = Arc::new(SecretCache::new(store));

    // Outbound clients; tokens come from the secret store by name.
    let helpdesk = HelpdeskClient::new(&HelpdeskConfig {
        base_url: config.upstream.helpdesk_base_url.clone(),
        token: secrets.get(&config.secrets.helpdesk_api_token)?,
        timeout_secs: config.upstream.request_timeout_secs,
    })?;
    let cloud = CloudSupportClient::new(&CloudSupportConfig {
        base_url: config.upstream.cloud_base_url.clone(),
        token: secrets.get(&config.secrets.cloud_api_token)?,
        timeout_secs: config.upstream.request_timeout_secs,
    })?;

    let sink = Arc::new(SqliteDeadLetterSink::new(db.clone()));
    let bus = Arc::new(EventBus::new(
        (&config.bus).into(),
        sink as Arc<dyn DeadLetterSink>,
    ));

    let to_cloud = HelpdeskToCloudHandler::new(db.clone(), Arc::new(cloud) as Arc<dyn SupportCaseApi>);
    let to_helpdesk = CloudToHelpdeskHandler::new(db.clone(), Arc::new(helpdesk) as Arc<dyn TicketApi>);
    bus.subscribe(
        EventSource::Helpdesk,
        Arc::new(to_cloud) as Arc<dyn EventHandler>,
    );
    bus.subscribe(
        EventSource::CloudSupport,
        Arc::new(to_helpdesk) as Arc<dyn EventHandler>,
    );

    let auth = Arc::new(BearerAuthenticator::new(
        Arc::clone(&secrets),
        config.secrets.webhook_bearer.clone(),
    ));

    let app = router(AppState {
        bus: Arc::clone(&bus),
        auth,
    });

    let addr: SocketAddr = config.server.addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Webhook ingress listening");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    bus.shutdown().await;
    info!(
        events_published = bus.events_published(),
        "Sync server stopped"
    );
    Ok(())
}

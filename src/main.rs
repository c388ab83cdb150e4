use anyhow::{Context, Result};
use object_broker::{
    clients::{BucketStore, MetadataStore, ReqwestHttpClient, SqliteMetadataStore},
    config::AppConfig,
    handlers::{
        health_handlers::{health_reporting, mark_not_serving},
        object_handlers::ObjectServiceImpl,
    },
    logger,
    routes::routes::routes,
    services::StoreRepository,
    shutdown::{GracefulShutdown, ShutdownOutcome, termination_signal},
    utils::OsRandom,
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    // --- Logging setup ---
    logger::init(cfg.app.env);
    tracing::info!("Starting object-broker with config: {:?}", cfg);

    // --- Optional metadata index ---
    let metadata = match &cfg.db {
        Some(db) => Some(
            SqliteMetadataStore::connect(&db.url)
                .await
                .with_context(|| format!("connecting to metadata database {}", db.url))?,
        ),
        None => None,
    };

    // --- Handle migration mode ---
    if migrate {
        match &metadata {
            // connect() already applied the schema.
            Some(_) => tracing::info!("Database migration complete."),
            None => anyhow::bail!("--migrate requires DB_URL or --database-url"),
        }
        return Ok(());
    }

    // --- Initialize clients and service ---
    let store = BucketStore::from_config(&cfg.store).context("building object store client")?;
    let http = ReqwestHttpClient::new().context("building HTTP client")?;

    let mut repo = StoreRepository::new(cfg.store.endpoint.clone(), Arc::new(store), Arc::new(http));
    if let Some(metadata) = &metadata {
        let metadata: Arc<dyn MetadataStore> = Arc::new(metadata.clone());
        repo = repo.with_metadata(metadata);
    }

    let object_service = ObjectServiceImpl::new(
        Arc::new(repo),
        Arc::new(OsRandom),
        cfg.store.bucket_name.clone(),
        cfg.app.max_file_size_bytes(),
    );

    // --- Build router ---
    let (health_reporter, health_service) = health_reporting().await;
    let router = routes(object_service, health_service, cfg.app.max_file_size_bytes())?;

    // --- Bind listener ---
    let listener = bind_listener(&cfg).await?;
    tracing::info!(addr = %listener.local_addr()?, "gRPC server listening");

    // --- Serve until shutdown ---
    let mut shutdown = GracefulShutdown::new(cfg.app.shutdown_timeout);
    let serve =
        router.serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.subscribe());
    let server = tokio::spawn(async move {
        if let Err(err) = serve.await {
            tracing::error!(error = %err, "gRPC server failed");
            std::process::exit(1);
        }
    });

    shutdown.register("health", async move {
        mark_not_serving(health_reporter).await;
        Ok(())
    });
    shutdown.register("server", async move {
        server.await?;
        Ok(())
    });
    if let Some(metadata) = metadata {
        shutdown.register("database", async move {
            metadata.close().await;
            Ok(())
        });
    }

    if shutdown.run(termination_signal()).await == ShutdownOutcome::TimedOut {
        std::process::exit(0);
    }

    tracing::info!("object-broker has been shutdown gracefully");
    Ok(())
}

/// Bind the configured address. A wildcard host that the process may not
/// bind is retried on loopback so local runs still come up.
async fn bind_listener(cfg: &AppConfig) -> Result<TcpListener> {
    let addr = cfg.addr();
    let err = match TcpListener::bind(&addr).await {
        Ok(listener) => return Ok(listener),
        Err(err) => err,
    };

    let wildcard = matches!(cfg.app.host.as_str(), "0.0.0.0" | "::");
    if err.kind() != ErrorKind::PermissionDenied || !wildcard {
        return Err(err).with_context(|| format!("binding {}", addr));
    }

    let loopback = format!("127.0.0.1:{}", cfg.app.port);
    tracing::warn!(%addr, %loopback, error = %err, "wildcard bind refused, using loopback");
    TcpListener::bind(&loopback)
        .await
        .with_context(|| format!("binding {}", loopback))
}

use std::env;
use tokio::net::TcpListener;
use tower_http::{cors::{Any, CorsLayer}, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edudb_quiz::{
    certificate::CertificateClient,
    config::{Config, ProgressBackend},
    db, routes, ProgressStore, QuestionBank,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "edudb_quiz=info,axum=info".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let bank = QuestionBank::builtin()?;

    let store = match &config.progress {
        ProgressBackend::Memory => ProgressStore::memory(),
        ProgressBackend::File(path) => ProgressStore::file(path),
        ProgressBackend::Postgres(url) => ProgressStore::Postgres(db::connect(url).await?),
    };
    tracing::info!(backend = store.backend(), "progress store ready");

    let certificates = config.certificate_service_url.as_deref().map(CertificateClient::new);
    if certificates.is_none() {
        tracing::warn!("CERTIFICATE_SERVICE_URL not set, certificates disabled");
    }

    let state = routes::AppState::new(bank, store, certificates);
    let app = routes::router(state)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on http://{}", config.bind_addr());

    axum::serve(listener, app).await?;
    Ok(())
}

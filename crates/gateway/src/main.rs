//! LeadForge API Gateway
//!
//! The HTTP entry point for lead intake.
//! Handles:
//! - Contact inquiries and property applications
//! - Income estimates
//! - Rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

#[cfg(test)]
mod tests;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    routing::{get, post},
    Router,
};
use leadforge_common::{
    cache::Cache,
    config::{AppConfig, LimiterBackend},
    db::{DbPool, LeadStore, MemoryStore, Repository},
    intake::LeadIntake,
    metrics,
    notify::{build_mailer, Notifier},
    ratelimit::{build_store, RateLimitStore},
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::middleware::rate_limit::{create_rate_limiter, rate_limit_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub intake: LeadIntake,
    pub contact_limiter: Arc<dyn RateLimitStore>,
    pub cache: Option<Arc<Cache>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting LeadForge API Gateway v{}",
        leadforge_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        install_metrics_exporter(config.observability.metrics_port)?;
    }
    metrics::register_metrics();

    // Lead store
    let store: Arc<dyn LeadStore> = if config.database.url.is_some() {
        let db = DbPool::new(&config.database).await?;
        if config.database.run_migrations {
            db.migrate().await?;
        }
        Arc::new(Repository::new(db))
    } else {
        warn!("database.url not set, applications are kept in memory only");
        Arc::new(MemoryStore::new())
    };

    // Redis only backs the shared rate limiter
    let cache = if config.rate_limit.contact.backend == LimiterBackend::Redis {
        info!("Connecting to Redis...");
        Some(Arc::new(Cache::new(&config.redis).await?))
    } else {
        None
    };

    let mailer = build_mailer(&config.email)?;
    let notifier = Notifier::new(mailer, &config);

    let state = AppState {
        config: config.clone(),
        intake: LeadIntake::new(store, notifier, &config),
        contact_limiter: build_store(&config.rate_limit.contact, cache.clone()),
        cache,
    };

    info!(
        store = state.intake.store().backend(),
        limiter = state.contact_limiter.backend(),
        email_configured = state.intake.notifier().is_configured(),
        "Collaborators ready"
    );

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn install_metrics_exporter(port: u16) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install()?;

    info!(port, "Prometheus exporter listening");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut app = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Lead intake
        .route(
            "/contact",
            post(handlers::contact::submit_contact).get(handlers::contact::contact_info),
        )
        .route(
            "/applications",
            post(handlers::applications::submit_application)
                .get(handlers::applications::applications_info),
        )

        // Estimates
        .route("/estimate", post(handlers::estimate::estimate_income))
        .route_layer(axum::middleware::from_fn(
            middleware::request_metrics::track_requests,
        ));

    if config.rate_limit.enabled {
        let limiter = create_rate_limiter(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst,
        );
        app = app.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
            rate_limit_middleware(request, next, limiter.clone())
        }));
    }

    // Compose the app
    app.layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.cors_origins))
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

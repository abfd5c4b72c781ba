use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use workshop_backend::config::AppConfig;
use workshop_backend::gateway::kashier::KashierGateway;
use workshop_backend::gateway::mock::MockGateway;
use workshop_backend::gateway::PaymentGateway;
use workshop_backend::notify::{AppsScriptClient, AutomationClient};
use workshop_backend::service::payment_service::PaymentService;
use workshop_backend::service::registration_service::RegistrationService;
use workshop_backend::store::postgres::PgRecordStore;
use workshop_backend::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = Arc::new(PgRecordStore { pool });
    let gateway: Arc<dyn PaymentGateway> = if cfg.kashier_mode == "mock" {
        Arc::new(MockGateway::new())
    } else {
        Arc::new(KashierGateway {
            live: cfg.kashier_mode == "live",
            merchant_id: cfg.kashier_merchant_id.clone(),
            api_key: cfg.kashier_api_key.clone(),
            secret: cfg.kashier_secret.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
        })
    };
    let automation: Option<Arc<dyn AutomationClient>> = cfg.apps_script_url.clone().map(|url| {
        Arc::new(AppsScriptClient {
            url,
            token: cfg.apps_script_token.clone(),
            client: reqwest::Client::new(),
        }) as Arc<dyn AutomationClient>
    });

    let payments = PaymentService {
        store,
        gateway,
        automation: automation.clone(),
        webhook_url: cfg.webhook_url(),
    };
    let registrations = RegistrationService { automation };

    let state = AppState {
        payments,
        registrations,
    };

    let app = Router::new()
        .route("/health", get(workshop_backend::http::handlers::ops::health))
        .route(
            "/api/register",
            post(workshop_backend::http::handlers::register::register),
        )
        .route(
            "/api/payment/session",
            post(workshop_backend::http::handlers::payments::create_session),
        )
        .route(
            "/api/payment/webhook",
            post(workshop_backend::http::handlers::payments::webhook),
        )
        .route(
            "/api/payment/status",
            get(workshop_backend::http::handlers::payments::status),
        )
        .route(
            "/api/payment/fulfill",
            post(workshop_backend::http::handlers::payments::fulfill),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

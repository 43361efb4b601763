use aeris_api::{app, AppState, AuthConfig};
use aeris_core::{Clock, SystemClock};
use aeris_shared::models::user::normalize_email;
use aeris_store::{Config, DbClient, EventProducer, InMemoryStore, PgStore, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aeris_api=debug,aeris_order=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Aeris API on port {}", config.server.port);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rules = config.business_rules.clone();
    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
        admin_emails: config.auth.admin_emails.iter().map(|e| normalize_email(e)).collect(),
        bcrypt_cost: config.auth.bcrypt_cost,
    };

    // Kafka Connection
    let kafka = if config.kafka.enabled {
        let producer = EventProducer::new(&config.kafka.brokers)
            .expect("Failed to create Kafka producer");
        Some(producer)
    } else {
        tracing::info!("Kafka disabled; booking events go to SSE subscribers only");
        None
    };

    // Database Connection
    let db = DbClient::from_config(&config.database)
        .await
        .expect("Failed to connect to Postgres");
    let state = match db {
        Some(db) => {
            db.migrate().await.expect("Failed to run migrations");
            let store = PgStore::new(db, rules.lock_timeout());
            AppState::new(Arc::new(store), clock, rules, auth, kafka)
        }
        None => {
            tracing::warn!("No database configured; running on the in-memory store");
            AppState::new(Arc::new(InMemoryStore::new()), clock, rules, auth, kafka)
        }
    };

    // Redis Connection
    let state = match &config.redis.url {
        Some(url) => match RedisClient::new(url).await {
            Ok(redis) => state.with_rate_limit(redis, config.redis.rate_limit_per_minute),
            Err(e) => {
                tracing::warn!("Redis unavailable, rate limiting disabled: {}", e);
                state
            }
        },
        None => state,
    };
    let state = state.with_cors_origin(config.server.cors_origin.clone());

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

use aeris_core::repository::{
    AerisStore, BookingRepository, FlightRepository, TransactionalStore, UserRepository,
};
use aeris_core::{Clock, CompositeSink, EventSink};
use aeris_order::{BookingEngine, EngineSettings, FlightAdmin};
use aeris_shared::BookingEvent;
use aeris_store::app_config::BusinessRules;
use aeris_store::{EventProducer, RedisClient};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::stream::BroadcastSink;

/// SSE subscribers that fall further behind than this miss events.
const SSE_CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    /// Normalized emails that register as admins.
    pub admin_emails: Vec<String>,
    pub bcrypt_cost: u32,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BookingEngine>,
    pub flight_admin: Arc<FlightAdmin>,
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub sse_tx: broadcast::Sender<BookingEvent>,
    pub rate_limit: Option<RateLimit>,
    /// `None` or `*` allows any origin.
    pub cors_origin: Option<String>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

impl AppState {
    /// Wires the engine and repositories onto one store. Booking events go
    /// to SSE subscribers and, when given, to Kafka.
    pub fn new<S>(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        business_rules: BusinessRules,
        auth: AuthConfig,
        kafka: Option<EventProducer>,
    ) -> Self
    where
        S: AerisStore + 'static,
    {
        let (sse_tx, _) = broadcast::channel(SSE_CHANNEL_CAPACITY);

        let mut sinks = CompositeSink::new().with(Arc::new(BroadcastSink::new(sse_tx.clone())));
        if let Some(producer) = kafka {
            sinks = sinks.with(Arc::new(producer));
        }
        let events: Arc<dyn EventSink> = Arc::new(sinks);

        let transactions: Arc<dyn TransactionalStore> = store.clone();
        let flights: Arc<dyn FlightRepository> = store.clone();
        let bookings: Arc<dyn BookingRepository> = store.clone();
        let users: Arc<dyn UserRepository> = store;

        let engine = BookingEngine::new(transactions.clone(), clock.clone())
            .with_pricing(business_rules.pricing_policy())
            .with_status_policy(business_rules.status_policy())
            .with_settings(EngineSettings {
                lock_timeout: business_rules.lock_timeout(),
                max_seats_per_booking: business_rules.max_seats_per_booking,
            })
            .with_events(events);

        let flight_admin = FlightAdmin::new(flights.clone(), transactions, clock.clone())
            .with_status_policy(business_rules.status_policy())
            .with_lock_timeout(business_rules.lock_timeout());

        Self {
            engine: Arc::new(engine),
            flight_admin: Arc::new(flight_admin),
            flights,
            bookings,
            users,
            clock,
            sse_tx,
            rate_limit: None,
            cors_origin: None,
            auth,
            business_rules,
        }
    }

    pub fn with_rate_limit(mut self, redis: RedisClient, per_minute: i64) -> Self {
        self.rate_limit = Some(RateLimit {
            redis: Arc::new(redis),
            per_minute,
        });
        self
    }

    pub fn with_cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }
}

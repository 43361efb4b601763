use aeris_catalog::{Flight, FlightUpdate, NewFlight};
use aeris_core::repository::{BookingRepository, FlightRepository, TransactionalStore};
use aeris_core::{CoreError, FixedClock, Identity};
use aeris_order::{AmendBooking, BookingEngine, CreateBooking, EngineSettings, FlightAdmin, OperationContext};
use aeris_shared::{BookingStatus, PerClass, TravelClass, TravellerDetails};
use aeris_store::InMemoryStore;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

struct Harness {
    store: InMemoryStore,
    clock: Arc<FixedClock>,
    engine: Arc<BookingEngine>,
    admin: FlightAdmin,
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap()
}

fn harness() -> Harness {
    harness_with(EngineSettings::default())
}

fn harness_with(settings: EngineSettings) -> Harness {
    let store = InMemoryStore::new();
    let clock = Arc::new(FixedClock::new(now()));
    let engine = BookingEngine::new(Arc::new(store.clone()), clock.clone()).with_settings(settings);
    let admin = FlightAdmin::new(Arc::new(store.clone()), Arc::new(store.clone()), clock.clone());

    Harness {
        store,
        clock,
        engine: Arc::new(engine),
        admin,
    }
}

fn traveller(first_name: &str) -> TravellerDetails {
    TravellerDetails {
        title: "Mx".to_string(),
        first_name: first_name.to_string(),
        last_name: "Doe".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 4, 2).unwrap(),
        nationality: "NZ".to_string(),
    }
}

fn travellers(n: usize) -> Vec<TravellerDetails> {
    (0..n).map(|i| traveller(&format!("T{}", i))).collect()
}

fn create(flight_id: Uuid, class: &str, seats: i32) -> CreateBooking {
    CreateBooking {
        flight_id,
        travel_class: class.to_string(),
        seat_count: seats,
        travellers: travellers(seats as usize),
    }
}

impl Harness {
    /// Economy at 100.00 per seat.
    async fn publish(&self, departs_in: Duration, economy_seats: i32) -> Flight {
        let departure = now() + departs_in;
        self.admin
            .create_flight(
                &Identity::admin(Uuid::new_v4()),
                NewFlight {
                    origin: "Auckland".to_string(),
                    destination: "Sydney".to_string(),
                    departure_time: departure,
                    arrival_time: departure + Duration::hours(3),
                    fares: PerClass::new(10000, 20000, 50000, 90000),
                    seats: PerClass::new(economy_seats, 4, 2, 0),
                },
            )
            .await
            .unwrap()
    }

    async fn available(&self, flight_id: Uuid, class: TravelClass) -> i32 {
        self.store
            .get_flight(flight_id)
            .await
            .unwrap()
            .unwrap()
            .inventory
            .available(class)
    }
}

#[tokio::test]
async fn test_booking_far_from_departure_pays_base_fare() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let customer = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(customer, create(flight.id, "Economy", 3)).await.unwrap();

    assert!(!receipt.is_premium);
    assert_eq!(receipt.total_price, 30000);
    assert_eq!(receipt.status, BookingStatus::Confirmed);
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 7);

    let booking = h.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
    assert_eq!(booking.user_id, customer.user_id);
    assert_eq!(booking.travellers.len(), 3);
}

#[tokio::test]
async fn test_booking_inside_surcharge_window_is_premium() {
    let h = harness();
    let flight = h.publish(Duration::minutes(30), 10).await;

    let receipt = h
        .engine
        .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Economy", 3))
        .await
        .unwrap();

    assert!(receipt.is_premium);
    assert_eq!(receipt.total_price, 39000);
}

#[tokio::test]
async fn test_booking_window_closed_leaves_seats_untouched() {
    let h = harness();
    let flight = h.publish(Duration::minutes(10), 10).await;

    let err = h
        .engine
        .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Economy", 3))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::BookingWindowClosed { .. }));
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
}

#[tokio::test]
async fn test_window_closes_as_clock_advances() {
    let h = harness();
    let flight = h.publish(Duration::minutes(20), 10).await;
    let customer = Identity::customer(Uuid::new_v4());

    h.engine.create_booking(customer, create(flight.id, "Economy", 1)).await.unwrap();

    h.clock.advance(Duration::minutes(5) + Duration::seconds(1));
    let err = h.engine.create_booking(customer, create(flight.id, "Economy", 1)).await.unwrap_err();
    assert!(matches!(err, CoreError::BookingWindowClosed { .. }));
}

#[tokio::test]
async fn test_request_validation() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let customer = Identity::customer(Uuid::new_v4());

    let mut mismatched = create(flight.id, "Economy", 2);
    mismatched.travellers.pop();
    assert!(matches!(
        h.engine.create_booking(customer, mismatched).await,
        Err(CoreError::ValidationError(_))
    ));

    assert!(matches!(
        h.engine.create_booking(customer, create(flight.id, "Cargo", 1)).await,
        Err(CoreError::InvalidTravelClass(_))
    ));

    assert!(matches!(
        h.engine.create_booking(customer, create(flight.id, "Economy", 0)).await,
        Err(CoreError::ValidationError(_))
    ));

    assert!(matches!(
        h.engine.create_booking(customer, create(flight.id, "Economy", 10)).await,
        Err(CoreError::ValidationError(_))
    ));

    assert!(matches!(
        h.engine.create_booking(customer, create(Uuid::new_v4(), "Economy", 1)).await,
        Err(CoreError::NotFound(_))
    ));

    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
}

#[tokio::test]
async fn test_insufficient_seats_reports_shortage() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;

    let err = h
        .engine
        .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Business", 3))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CoreError::InsufficientSeats {
            class: TravelClass::Business,
            requested: 3,
            available: 2,
        }
    );
    assert_eq!(h.available(flight.id, TravelClass::Business).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_is_sold_exactly_once() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 1).await;

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.engine.clone();
            let request = create(flight.id, "Economy", 1);
            tokio::spawn(async move {
                engine
                    .create_booking(Identity::customer(Uuid::new_v4()), request)
                    .await
            })
        })
        .collect();

    let mut confirmed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(CoreError::InsufficientSeats { available, .. }) => assert_eq!(available, 0),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 0);
}

#[tokio::test]
async fn test_cancel_restores_inventory_exactly() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let customer = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(customer, create(flight.id, "PremiumEconomy", 3)).await.unwrap();
    assert_eq!(h.available(flight.id, TravelClass::PremiumEconomy).await, 1);

    h.engine.cancel_booking(customer, receipt.booking_id).await.unwrap();
    assert_eq!(h.available(flight.id, TravelClass::PremiumEconomy).await, 4);

    let booking = h.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.cancelled_at, Some(now()));
    assert_eq!(booking.travellers.len(), 3);

    assert!(matches!(
        h.engine.cancel_booking(customer, receipt.booking_id).await,
        Err(CoreError::Conflict(_))
    ));
    assert_eq!(h.available(flight.id, TravelClass::PremiumEconomy).await, 4);
}

#[tokio::test]
async fn test_only_owner_or_admin_may_cancel() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 2)).await.unwrap();

    assert!(matches!(
        h.engine.cancel_booking(Identity::customer(Uuid::new_v4()), receipt.booking_id).await,
        Err(CoreError::Forbidden(_))
    ));
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 8);

    h.engine
        .cancel_booking(Identity::admin(Uuid::new_v4()), receipt.booking_id)
        .await
        .unwrap();
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);

    assert!(matches!(
        h.engine.cancel_booking(owner, Uuid::new_v4()).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_amendment_keeps_previous_allocation() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 4).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 2)).await.unwrap();
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 2);

    // Releasing the 2 held seats leaves 4, not enough for 5.
    let err = h
        .engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "Economy".to_string(),
                seat_count: 5,
                travellers: Some(travellers(5)),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Conflict(_)));
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 2);

    let booking = h.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
    assert_eq!(booking.seat_count, 2);
    assert_eq!(booking.travellers.len(), 2);
}

#[tokio::test]
async fn test_amendment_moves_seats_and_reprices() {
    let h = harness();
    let flight = h.publish(Duration::hours(2), 10).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 2)).await.unwrap();
    assert_eq!(receipt.total_price, 20000);

    // Now inside the surcharge window.
    h.clock.advance(Duration::minutes(90));

    let amended = h
        .engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "Business".to_string(),
                seat_count: 1,
                travellers: Some(travellers(1)),
            },
        )
        .await
        .unwrap();

    assert_eq!(amended.booking_id, receipt.booking_id);
    assert!(amended.is_premium);
    assert_eq!(amended.total_price, 65000);
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
    assert_eq!(h.available(flight.id, TravelClass::Business).await, 1);

    let booking = h.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
    assert_eq!(booking.travel_class, TravelClass::Business);
    assert!(booking.travellers_match_seats());
}

#[tokio::test]
async fn test_amendment_can_grow_into_own_seats() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 3).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 2)).await.unwrap();
    h.engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "Economy".to_string(),
                seat_count: 3,
                travellers: Some(travellers(3)),
            },
        )
        .await
        .unwrap();

    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 0);
}

#[tokio::test]
async fn test_amendment_requires_travellers_when_count_changes() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 2)).await.unwrap();

    let err = h
        .engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "Economy".to_string(),
                seat_count: 3,
                travellers: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    // Same count, different class: travellers carry over.
    h.engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "PremiumEconomy".to_string(),
                seat_count: 2,
                travellers: None,
            },
        )
        .await
        .unwrap();

    let booking = h.store.get_booking(receipt.booking_id).await.unwrap().unwrap();
    assert_eq!(booking.travel_class, TravelClass::PremiumEconomy);
    assert_eq!(booking.travellers.len(), 2);
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
}

#[tokio::test]
async fn test_cancelled_booking_cannot_be_amended() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 1)).await.unwrap();
    h.engine.cancel_booking(owner, receipt.booking_id).await.unwrap();

    let err = h
        .engine
        .amend_booking(
            owner,
            receipt.booking_id,
            AmendBooking {
                travel_class: "Economy".to_string(),
                seat_count: 1,
                travellers: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
}

#[tokio::test]
async fn test_lock_wait_is_bounded() {
    let h = harness_with(EngineSettings {
        lock_timeout: StdDuration::from_millis(50),
        ..EngineSettings::default()
    });
    let flight = h.publish(Duration::hours(5), 10).await;

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_flight(flight.id).await.unwrap();

    let err = h
        .engine
        .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Economy", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Timeout(_)));
    assert!(err.is_retryable());

    holder.rollback().await.unwrap();
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
}

#[tokio::test]
async fn test_cutoff_is_checked_after_lock_wait() {
    let h = harness();
    let flight = h.publish(Duration::minutes(15) + Duration::seconds(1), 10).await;

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_flight(flight.id).await.unwrap();

    let engine = h.engine.clone();
    let pending = tokio::spawn(async move {
        engine
            .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Economy", 1))
            .await
    });
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    h.clock.advance(Duration::seconds(3));
    holder.rollback().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::BookingWindowClosed { .. }));
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 10);
}

#[tokio::test]
async fn test_cancel_records_time_lock_was_taken() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let customer = Identity::customer(Uuid::new_v4());
    let receipt = h.engine.create_booking(customer, create(flight.id, "Economy", 2)).await.unwrap();

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_flight(flight.id).await.unwrap();

    let engine = h.engine.clone();
    let booking_id = receipt.booking_id;
    let pending = tokio::spawn(async move { engine.cancel_booking(customer, booking_id).await });
    tokio::time::sleep(StdDuration::from_millis(20)).await;

    h.clock.advance(Duration::seconds(2));
    holder.rollback().await.unwrap();
    pending.await.unwrap().unwrap();

    let booking = h.store.get_booking(booking_id).await.unwrap().unwrap();
    let expected = now() + Duration::seconds(2);
    assert_eq!(booking.cancelled_at, Some(expected));
    assert_eq!(booking.updated_at, expected);
    assert_eq!(booking.booking_date, now());
}

#[tokio::test]
async fn test_caller_deadline_rolls_back() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;

    let mut holder = h.store.begin().await.unwrap();
    holder.lock_flight(flight.id).await.unwrap();

    let ctx = OperationContext::new(Identity::customer(Uuid::new_v4()))
        .with_timeout(StdDuration::from_millis(30));
    let err = h
        .engine
        .create_booking(ctx, create(flight.id, "Economy", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Timeout(_)));

    drop(holder);
    let receipt = h
        .engine
        .create_booking(Identity::customer(Uuid::new_v4()), create(flight.id, "Economy", 1))
        .await
        .unwrap();
    assert_eq!(receipt.total_price, 10000);
    assert_eq!(h.available(flight.id, TravelClass::Economy).await, 9);
}

#[tokio::test]
async fn test_flight_delete_refused_while_booked() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let admin = Identity::admin(Uuid::new_v4());
    let owner = Identity::customer(Uuid::new_v4());

    let receipt = h.engine.create_booking(owner, create(flight.id, "Economy", 1)).await.unwrap();
    assert!(matches!(
        h.admin.delete_flight(&admin, flight.id).await,
        Err(CoreError::Conflict(_))
    ));

    h.engine.cancel_booking(owner, receipt.booking_id).await.unwrap();
    h.admin.delete_flight(&admin, flight.id).await.unwrap();

    assert!(h.store.get_flight(flight.id).await.unwrap().is_none());
    assert!(matches!(
        h.engine.create_booking(owner, create(flight.id, "Economy", 1)).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_flight_admin_details_and_updates() {
    let h = harness();
    let flight = h.publish(Duration::hours(5), 10).await;
    let admin = Identity::admin(Uuid::new_v4());
    let customer = Identity::customer(Uuid::new_v4());

    h.engine.create_booking(customer, create(flight.id, "Economy", 3)).await.unwrap();

    let details = h.admin.get_flight_details(&admin, flight.id).await.unwrap();
    assert_eq!(details.classes.economy.booked, 3);
    assert_eq!(details.classes.economy.available, 7);
    assert_eq!(details.classes.economy.total, 10);
    assert_eq!(details.total_flight_seats, 16);

    let updated = h
        .admin
        .update_flight(
            &admin,
            flight.id,
            FlightUpdate {
                fares: Some(PerClass::new(12000, 20000, 50000, 90000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.fares.economy, 12000);
    assert_eq!(updated.inventory.available(TravelClass::Economy), 7);

    assert!(matches!(
        h.admin.get_flight_details(&customer, flight.id).await,
        Err(CoreError::Forbidden(_))
    ));
}

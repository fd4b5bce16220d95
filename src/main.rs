//! Fleet Booking
//!
//! Runs a booking walkthrough against the in-memory store, then keeps the
//! hold expiry task running until Ctrl+C. Reads configuration from a TOML
//! file (~/.config/fleet-booking/config.toml, or `$FLEET_CONFIG`).

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use fleet_booking::application::events::{
    RESERVATION_CANCELED, RESERVATION_COMPLETED, RESERVATION_CONFIRMED, RESERVATION_CREATED,
};
use fleet_booking::application::services::{
    start_hold_expiry_task, BookingLocks, RegisterUser, RegisterVehicle,
};
use fleet_booking::domain::entity::Entity;
use fleet_booking::domain::{RepositoryProvider, UserRole, VehicleClassification};
use fleet_booking::infrastructure::{EventJournal, LoggingNotifier, SimulatedPaymentGateway};
use fleet_booking::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};
use fleet_booking::{
    create_event_bus, default_config_path, AppConfig, BookingSettings, CreateReservation,
    FleetService, InMemoryRepositories, ReservationService,
};

const ALL_EVENTS: [&str; 4] = [
    RESERVATION_CREATED,
    RESERVATION_CONFIRMED,
    RESERVATION_CANCELED,
    RESERVATION_COMPLETED,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = default_config_path();
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_tracing(&app_cfg);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => error!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting Fleet Booking...");

    // ── Wiring ─────────────────────────────────────────────────
    let settings = BookingSettings::from_config(&app_cfg)?;
    info!(
        base_rate = %settings.base_rate,
        overlap_policy = ?settings.overlap_policy,
        hold_timeout_min = settings.hold_timeout.num_minutes(),
        "Booking settings"
    );

    let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositories::new());
    let event_bus = create_event_bus();
    let journal = Arc::new(EventJournal::new());
    event_bus.subscribe_many(&ALL_EVENTS, Arc::new(LoggingNotifier));
    event_bus.subscribe_many(&ALL_EVENTS, journal.clone());

    let payments = Arc::new(SimulatedPaymentGateway::new());
    payments.decline_method("pm_declined", "insufficient funds");

    let locks = BookingLocks::shared();
    let reservations = Arc::new(
        ReservationService::new(repos.clone(), event_bus.clone(), payments.clone(), settings)
            .with_locks(locks.clone()),
    );
    let fleet = FleetService::new(repos.clone()).with_locks(locks);

    // ── Walkthrough ────────────────────────────────────────────
    if let Err(e) = walkthrough(&fleet, &reservations).await {
        warn!(error = %e, "Walkthrough stopped early");
    }
    info!(
        events = journal.len(),
        charges = payments.charge_count(),
        "Walkthrough finished"
    );

    // ── Background tasks ───────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    let expiry = start_hold_expiry_task(
        reservations.clone(),
        shutdown.clone(),
        std::time::Duration::from_secs(app_cfg.booking.expiry_check_interval_secs.max(1)),
    );

    info!("Press Ctrl+C to shut down.");
    listen_for_shutdown_signals(shutdown.clone()).await;

    if let Err(e) = expiry.await {
        error!("Hold expiry task panicked: {}", e);
    }
    info!("Fleet Booking shutdown complete");
    Ok(())
}

async fn walkthrough(
    fleet: &FleetService,
    reservations: &ReservationService,
) -> fleet_booking::DomainResult<()> {
    let admin = fleet
        .register_user(RegisterUser {
            name: "Fleet Admin".into(),
            email: "admin@fleet.local".into(),
            password: "ChangeMe123".into(),
            role: UserRole::Admin,
            reservation_quota: 0,
        })
        .await?;
    let customer = fleet
        .register_user(RegisterUser {
            name: "Jordan Customer".into(),
            email: "jordan@example.com".into(),
            password: "Secret1234".into(),
            role: UserRole::User,
            reservation_quota: 1,
        })
        .await?;
    let vehicle = fleet
        .register_vehicle(RegisterVehicle {
            model: "Toyota Corolla".into(),
            plate: "FLT2024".into(),
            year: 2024,
            classification: VehicleClassification::Compact,
        })
        .await?;

    let start = Utc::now() + Duration::days(1);
    let booked = reservations
        .create_reservation(CreateReservation {
            user_id: customer.id().clone(),
            vehicle_id: vehicle.id().clone(),
            start_time: start,
            end_time: start + Duration::hours(2),
        })
        .await?;
    info!(reservation_id = %booked.id(), amount = %booked.total_amount(), "Booked");

    // Same slot again: rejected by the overlap rule.
    let clash = reservations
        .create_reservation(CreateReservation {
            user_id: customer.id().clone(),
            vehicle_id: vehicle.id().clone(),
            start_time: start + Duration::hours(1),
            end_time: start + Duration::hours(3),
        })
        .await;
    if let Err(e) = clash {
        info!(error = %e, "Overlapping booking rejected as expected");
    }

    if let Err(e) = reservations.confirm_reservation(booked.id(), "pm_declined").await {
        info!(error = %e, "Declined card left the reservation pending");
    }
    let confirmed = reservations.confirm_reservation(booked.id(), "pm_visa").await?;
    info!(reservation_id = %confirmed.id(), status = %confirmed.status(), "Confirmed");

    let canceled = reservations
        .cancel_reservation(booked.id(), "customer changed plans")
        .await?;
    info!(reservation_id = %canceled.id(), status = %canceled.status(), "Canceled");

    fleet
        .change_user_status(admin.id(), customer.id(), fleet_booking::domain::UserStatus::Blocked)
        .await?;
    Ok(())
}

/// Initialize tracing (logging) from the application config.
fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

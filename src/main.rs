use anyhow::Context;
use chrono::Local;
use cinema_booking::{Cinema, CinemaConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Runs a scripted walk through the booking flow on the demo data set.
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = CinemaConfig::from_env().context("invalid cinema configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut cinema = Cinema::seeded(config, Local::now().naive_local())?;
    info!("demo cinema ready");

    println!("--- MOVIES ---");
    for movie in cinema.movies() {
        println!("- {movie}");
    }

    println!("\n--- SHOWTIMES ---");
    for showtime in cinema.all_schedules_in_order() {
        println!("- {showtime}");
    }

    let email = "guest@example.com";
    let user_id = cinema.register_user("Guest", email)?.id.clone();
    println!("\nRegistered user {user_id}");

    let record = cinema.reserve_seats(email, "F1", &["A1", "A2", "B3"])?;
    println!(
        "Reservation {} created - Total: ${}",
        record.id(),
        record.total()
    );

    // B3 is now taken, so A4 must not stay reserved either
    if let Err(error) = cinema.reserve_seats(email, "F1", &["A4", "B3"]) {
        println!("Second reservation refused: {error}");
    }

    for room in cinema.rooms() {
        println!("\n--- SEATS ROOM {} ---\n{}", room.number(), *room.grid());
    }

    let cancelled = cinema.cancel_reservation(record.id());
    println!("\nCancelled {}: {cancelled}", record.id());

    let occupancy = cinema.room_occupancy(1)?;
    println!(
        "Room 1: {} of {} seats occupied",
        occupancy.occupied, occupancy.total
    );

    Ok(())
}

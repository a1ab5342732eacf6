//! An in-memory cinema booking core: a chronological index of showtimes,
//! per-room seat grids, and all-or-nothing multi-seat reservations.
//!
//! ## Architecture
//!
//! The crate is built from three layers:
//!
//! 1. `OrderedIndex`: an unbalanced binary search tree keeping showtimes in
//!    start-time order
//! 2. `Room` / `SeatGrid`: a fixed occupancy matrix with bounds-checked
//!    reserve and release, shared by every showtime in that room
//! 3. `SeatTransaction` and `ReservationLedger`: the reservation protocol.
//!    A transaction reserves seats one by one and releases all of them again
//!    if any seat fails; the ledger records successful reservations and undoes
//!    them on cancellation
//!
//! `Cinema` ties them together with a movie catalog and a user registry, and
//! owns all of that state.
//!
//! ## Example Usage
//!
//! ```rust
//! use cinema_booking::{BookingError, Cinema, CinemaConfig};
//! use chrono::NaiveDate;
//!
//! let now = NaiveDate::from_ymd_opt(2024, 5, 1)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let mut cinema = Cinema::seeded(CinemaConfig::default(), now).unwrap();
//! cinema.register_user("Ana", "ana@example.com").unwrap();
//!
//! // Showtimes come out earliest first
//! for showtime in cinema.all_schedules_in_order() {
//!     println!("{showtime}");
//! }
//!
//! // Room 1 is 4 rows by 6 columns; "B2" is taken, so "A1" is rolled back
//! cinema.reserve_seats("ana@example.com", "F1", &["B2"]).unwrap();
//! let result = cinema.reserve_seats("ana@example.com", "F1", &["A1", "B2"]);
//! assert!(matches!(result, Err(BookingError::SeatUnavailable { .. })));
//! assert_eq!(cinema.room_occupancy(1).unwrap().occupied, 1);
//! ```
//!
//! ## Thread Safety
//!
//! `Cinema` itself is mutated through `&mut self`. Rooms are `Send + Sync`:
//! their grid sits behind a `parking_lot::RwLock`, and a `SeatTransaction`
//! holds the write lock for its whole seat list, so reservations racing on the
//! same room through `Room::begin_transaction` stay all-or-nothing.

mod cinema;
pub mod config;
mod error;
mod ledger;
mod ordered_index;
mod registry;
mod seat_grid;
mod transaction;
mod types;

// Re-export public API
pub use cinema::Cinema;
pub use config::CinemaConfig;
pub use error::{BookingError, ConfigError, Result};
pub use ledger::{ReservationLedger, ReservationRecord};
pub use ordered_index::{IndexKey, Iter, OrderedIndex};
pub use registry::{MovieCatalog, User, UserRegistry};
pub use seat_grid::{Room, SeatGrid};
pub use transaction::SeatTransaction;
pub use types::{
    Movie, MovieId, Occupancy, ReservationId, ScheduleEntry, ScheduleId, SeatLabel, SeatPosition,
    UserId,
};

// Re-export commonly used external dependencies
pub use parking_lot::RwLock;
pub use rust_decimal::Decimal;

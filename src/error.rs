//! Error types for booking operations.

use thiserror::Error;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Every failure a caller of the booking core can observe.
///
/// All variants are recoverable. A failed reservation never leaves any of its
/// seats occupied, so callers can retry with a different seat list directly.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// No schedule entry carries the requested id.
    #[error("schedule entry not found: {id}")]
    ScheduleNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The seat label could not be decoded into coordinates.
    #[error("invalid seat label: {label:?}")]
    InvalidSeatLabel {
        /// The label as supplied.
        label: String,
    },

    /// The seat is out of the room's bounds or already occupied.
    #[error("seat {label} is not available")]
    SeatUnavailable {
        /// The first label of the request that could not be reserved.
        label: String,
    },

    /// The reservation was already cancelled.
    #[error("reservation {id} is already inactive")]
    AlreadyInactive {
        /// The reservation id.
        id: String,
    },

    /// No reservation carries the requested id.
    #[error("reservation not found: {id}")]
    ReservationNotFound {
        /// The id that was looked up.
        id: String,
    },

    /// No registered user has this e-mail.
    #[error("no user registered with e-mail {email}")]
    HolderNotFound {
        /// The e-mail that was looked up.
        email: String,
    },

    /// A user with this e-mail is already registered.
    #[error("e-mail already registered: {email}")]
    DuplicateEmail {
        /// The conflicting e-mail.
        email: String,
    },

    /// A movie with this id is already in the catalog.
    #[error("movie already exists: {id}")]
    DuplicateMovie {
        /// The conflicting movie id.
        id: String,
    },

    /// The catalog has no movie with this id.
    #[error("unknown movie: {id}")]
    UnknownMovie {
        /// The id that was looked up.
        id: String,
    },

    /// A room with this number is already registered.
    #[error("room {number} already exists")]
    DuplicateRoom {
        /// The conflicting room number.
        number: u32,
    },

    /// The room dimensions do not describe an allocatable grid.
    #[error("invalid room size: {rows} x {columns}")]
    InvalidRoomSize {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        columns: usize,
    },

    /// No room carries this number.
    #[error("unknown room: {number}")]
    UnknownRoom {
        /// The number that was looked up.
        number: u32,
    },
}

/// Errors raised while reading [`CinemaConfig`](crate::CinemaConfig) from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An identifier prefix was set to an empty string.
    #[error("{variable} must not be empty")]
    EmptyPrefix {
        /// The offending environment variable.
        variable: &'static str,
    },
}

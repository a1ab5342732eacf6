use crate::error::{BookingError, Result};
use crate::ordered_index::IndexKey;
use crate::seat_grid::Room;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of a movie in the catalog, e.g. `P1`.
pub type MovieId = String;
/// Identifier of a schedule entry, e.g. `F1`.
pub type ScheduleId = String;
/// Identifier of a registered user, e.g. `U1`.
pub type UserId = String;
/// Identifier of a reservation record, e.g. `R1`.
pub type ReservationId = String;

/// A movie that can be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    /// Catalog identifier
    pub id: MovieId,
    /// Display title
    pub title: String,
    /// Free-form genre
    pub genre: String,
    /// Running time in minutes
    pub duration_minutes: u32,
}

impl Movie {
    /// Creates a new movie.
    pub fn new(
        id: impl Into<MovieId>,
        title: impl Into<String>,
        genre: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            genre: genre.into(),
            duration_minutes,
        }
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}min) - ID: {}",
            self.title, self.duration_minutes, self.id
        )
    }
}

/// A showtime: one screening of a movie in a room at a given time.
///
/// Entries are immutable once created. The room is shared with every other
/// entry screening in the same physical room, so reservations made through any
/// of them compete for the same seats.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    id: ScheduleId,
    movie: Arc<Movie>,
    room: Arc<Room>,
    starts_at: NaiveDateTime,
    unit_price: Decimal,
}

impl ScheduleEntry {
    /// Creates a new schedule entry.
    pub fn new(
        id: impl Into<ScheduleId>,
        movie: Arc<Movie>,
        room: Arc<Room>,
        starts_at: NaiveDateTime,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            movie,
            room,
            starts_at,
            unit_price,
        }
    }

    /// Showtime identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The movie being screened.
    pub fn movie(&self) -> &Arc<Movie> {
        &self.movie
    }

    /// The room the showtime screens in, shared with its other showtimes.
    pub fn room(&self) -> &Arc<Room> {
        &self.room
    }

    /// Start time; the showtime index is ordered by it.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.starts_at
    }

    /// Price of a single seat.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Total price of `seat_count` seats for this showtime.
    pub fn price_for(&self, seat_count: usize) -> Decimal {
        Decimal::from(seat_count) * self.unit_price
    }
}

impl IndexKey for ScheduleEntry {
    type Key = NaiveDateTime;

    fn index_key(&self) -> &NaiveDateTime {
        &self.starts_at
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ID: {}] {} - Room {} - {} - Price: ${}",
            self.id,
            self.movie.title,
            self.room.number(),
            self.starts_at.format("%d/%m %H:%M"),
            self.unit_price
        )
    }
}

/// Zero-based grid coordinates of a seat.
///
/// Coordinates are signed: a label such as `"A0"` decodes to column `-1`, and
/// it is the grid's bounds check, not the decoder, that rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeatPosition {
    /// Zero-based row, `A` being 0
    pub row: i64,
    /// Zero-based column, `1` being 0
    pub column: i64,
}

impl SeatPosition {
    /// Creates a position from zero-based coordinates.
    pub fn new(row: i64, column: i64) -> Self {
        Self { row, column }
    }
}

/// A seat address in its external `"<letter><number>"` form, together with
/// its decoded grid position.
///
/// The letter selects the row (`A` or `a` is row 0), the number selects the
/// column (`1` is column 0). The original text is kept verbatim so that
/// reservation records report seats exactly as they were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLabel {
    text: String,
    position: SeatPosition,
}

impl SeatLabel {
    /// Decodes a seat label.
    ///
    /// Only the shape of the label is checked here: the first character is
    /// mapped to a row without validating it against the alphabet, and the
    /// remainder must be an integer. Whether the position exists in a given
    /// room is decided later by the room's grid.
    ///
    /// ## Errors
    ///
    /// [`BookingError::InvalidSeatLabel`] if the label is empty or its suffix
    /// is not an integer. An integer too large for `i64` is not a decode
    /// error: it is clamped and later rejected by the grid.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cinema_booking::{SeatLabel, SeatPosition};
    ///
    /// let seat = SeatLabel::parse("b3").unwrap();
    /// assert_eq!(seat.position(), SeatPosition::new(1, 2));
    /// assert_eq!(seat.as_str(), "b3");
    ///
    /// // Out-of-alphabet rows still decode; the grid rejects them.
    /// assert_eq!(SeatLabel::parse("Z9").unwrap().position().row, 25);
    /// assert!(SeatLabel::parse("A").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || BookingError::InvalidSeatLabel {
            label: text.to_string(),
        };

        let mut chars = text.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        // Numbers beyond i64 are still numbers: clamp them so the grid rejects them
        let number: i64 = match chars.as_str().parse::<i64>() {
            Ok(number) => number,
            Err(error) => match error.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => return Err(invalid()),
            },
        };

        let row = i64::from(u32::from(letter.to_ascii_uppercase())) - i64::from(u32::from('A'));
        let column = number.saturating_sub(1);

        Ok(Self {
            text: text.to_string(),
            position: SeatPosition::new(row, column),
        })
    }

    /// The label exactly as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The decoded, not yet bounds-checked, grid position.
    pub fn position(&self) -> SeatPosition {
        self.position
    }
}

impl FromStr for SeatLabel {
    type Err = BookingError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text)
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Occupied versus total seats of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Seats currently taken
    pub occupied: usize,
    /// Seats in the room
    pub total: usize,
}

impl Occupancy {
    /// Number of free seats.
    pub fn available(&self) -> usize {
        self.total - self.occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_label_is_case_insensitive() {
        let upper = SeatLabel::parse("C4").unwrap();
        let lower = SeatLabel::parse("c4").unwrap();
        assert_eq!(upper.position(), lower.position());
        assert_eq!(upper.position(), SeatPosition::new(2, 3));
    }

    #[test]
    fn test_seat_label_decode_failures() {
        for text in ["", "A", "AB", "A1x", "1.5"] {
            assert_eq!(
                SeatLabel::parse(text),
                Err(BookingError::InvalidSeatLabel {
                    label: text.to_string()
                }),
                "{text:?} should not decode"
            );
        }
    }

    #[test]
    fn test_seat_label_passes_odd_coordinates_through() {
        // A digit as the row letter lands below 'A'
        assert!(SeatLabel::parse("11").unwrap().position().row < 0);
        assert_eq!(SeatLabel::parse("A0").unwrap().position().column, -1);
        assert_eq!(SeatLabel::parse("A12").unwrap().position().column, 11);
    }

    #[test]
    fn test_seat_label_clamps_overflowing_numbers() {
        let huge = SeatLabel::parse("A99999999999999999999").unwrap();
        assert_eq!(huge.position(), SeatPosition::new(0, i64::MAX - 1));

        let tiny = SeatLabel::parse("A-99999999999999999999").unwrap();
        assert_eq!(tiny.position().column, i64::MIN);

        let smallest = SeatLabel::parse("A-9223372036854775808").unwrap();
        assert_eq!(smallest.position().column, i64::MIN);
    }

    #[test]
    fn test_occupancy_available() {
        let occupancy = Occupancy {
            occupied: 2,
            total: 24,
        };
        assert_eq!(occupancy.available(), 22);
    }
}

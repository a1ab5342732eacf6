use crate::error::{BookingError, Result};
use crate::types::{ReservationId, ScheduleEntry, SeatLabel, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// A completed reservation.
///
/// Records are created only by a fully successful reservation and are never
/// removed: cancelling one clears [`active`](ReservationRecord::is_active) and
/// gives its seats back to the room.
#[derive(Debug, Clone)]
pub struct ReservationRecord {
    id: ReservationId,
    holder: UserId,
    schedule: Arc<ScheduleEntry>,
    seats: Vec<SeatLabel>,
    total: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl ReservationRecord {
    /// Reservation id, such as `R1`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the user holding the reservation.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Showtime the seats were reserved for.
    pub fn schedule(&self) -> &Arc<ScheduleEntry> {
        &self.schedule
    }

    /// Seats in the order they were requested, as originally written.
    pub fn seats(&self) -> &[SeatLabel] {
        &self.seats
    }

    /// Seat count times the showtime's unit price.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// `false` once the reservation has been cancelled.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// When the reservation was opened.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the reservation was cancelled, if it was.
    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }
}

/// Keyed store of reservation records.
///
/// The ledger allocates reservation ids sequentially (`<prefix>1`,
/// `<prefix>2`, ...) and owns the cancellation logic, since cancelling is the
/// only operation that mutates a record after it was created.
#[derive(Debug)]
pub struct ReservationLedger {
    prefix: String,
    next_sequence: u64,
    records: HashMap<ReservationId, ReservationRecord>,
}

impl ReservationLedger {
    /// Creates an empty ledger whose ids start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        ReservationLedger {
            prefix: prefix.into(),
            next_sequence: 1,
            records: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> ReservationId {
        let id = format!("{}{}", self.prefix, self.next_sequence);
        self.next_sequence += 1;
        id
    }

    /// Registers a reservation whose seats are already committed on the
    /// schedule's room grid.
    ///
    /// ## Returns
    ///
    /// The new record, active, with a freshly allocated id and its total
    /// computed from the showtime's unit price.
    pub fn open(
        &mut self,
        holder: UserId,
        schedule: Arc<ScheduleEntry>,
        seats: Vec<SeatLabel>,
        created_at: DateTime<Utc>,
    ) -> &ReservationRecord {
        let id = self.next_id();
        let record = ReservationRecord {
            id: id.clone(),
            holder,
            total: schedule.price_for(seats.len()),
            schedule,
            seats,
            active: true,
            created_at,
            cancelled_at: None,
        };

        self.records.entry(id).or_insert(record)
    }

    /// Looks up a record by id, cancelled ones included.
    pub fn get(&self, id: &str) -> Option<&ReservationRecord> {
        self.records.get(id)
    }

    /// Cancels a reservation and releases its seats.
    ///
    /// Each seat of the record is released on the showtime's room grid under a
    /// single write lock. A release that reports `false` means the grid was
    /// changed behind the ledger's back; it is logged and the cancellation
    /// still succeeds.
    ///
    /// ## Errors
    ///
    /// - [`BookingError::ReservationNotFound`] if no record has this id
    /// - [`BookingError::AlreadyInactive`] if the record was already cancelled
    pub fn cancel(&mut self, id: &str, cancelled_at: DateTime<Utc>) -> Result<&ReservationRecord> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| BookingError::ReservationNotFound { id: id.to_string() })?;

        if !record.active {
            return Err(BookingError::AlreadyInactive { id: id.to_string() });
        }

        record.active = false;
        record.cancelled_at = Some(cancelled_at);

        let room = record.schedule.room();
        let mut grid = room.grid_mut();
        for seat in &record.seats {
            if !grid.release(seat.position()) {
                error!(
                    reservation = %record.id,
                    room = room.number(),
                    seat = %seat,
                    "seat of an active reservation was not occupied"
                );
            }
        }
        drop(grid);

        info!(
            reservation = %record.id,
            seats = record.seats.len(),
            "reservation cancelled"
        );
        Ok(&*record)
    }

    /// Number of records, cancelled ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the records that have not been cancelled, in no
    /// particular order.
    pub fn active(&self) -> impl Iterator<Item = &ReservationRecord> {
        self.records.values().filter(|record| record.active)
    }
}

impl Default for ReservationLedger {
    fn default() -> Self {
        Self::new("R")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat_grid::Room;
    use crate::types::Movie;
    use chrono::NaiveDate;

    fn schedule(room: Arc<Room>) -> Arc<ScheduleEntry> {
        let movie = Arc::new(Movie::new("P1", "Avengers", "Action", 150));
        let starts_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        Arc::new(ScheduleEntry::new(
            "F1",
            movie,
            room,
            starts_at,
            Decimal::new(100, 1),
        ))
    }

    fn committed(room: &Room, labels: &[&str]) -> Vec<SeatLabel> {
        let seats: Vec<SeatLabel> = labels
            .iter()
            .map(|label| SeatLabel::parse(label).unwrap())
            .collect();
        let mut transaction = room.begin_transaction();
        transaction.reserve_all(&seats).unwrap();
        transaction.commit();
        seats
    }

    #[test]
    fn test_ids_are_sequential() {
        let room = Arc::new(Room::new(1, 4, 6).unwrap());
        let entry = schedule(Arc::clone(&room));
        let mut ledger = ReservationLedger::new("R");

        let first = ledger
            .open("U1".into(), Arc::clone(&entry), committed(&room, &["A1"]), Utc::now())
            .id()
            .to_string();
        let second = ledger
            .open("U1".into(), entry, committed(&room, &["A2"]), Utc::now())
            .id()
            .to_string();

        assert_eq!(first, "R1");
        assert_eq!(second, "R2");
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_total_is_seat_count_times_price() {
        let room = Arc::new(Room::new(1, 4, 6).unwrap());
        let entry = schedule(Arc::clone(&room));
        let mut ledger = ReservationLedger::default();

        let record = ledger.open(
            "U1".into(),
            entry,
            committed(&room, &["A1", "B2", "C3"]),
            Utc::now(),
        );
        assert_eq!(record.total(), Decimal::new(300, 1));
        assert!(record.is_active());
    }

    #[test]
    fn test_cancel_releases_seats_once() {
        let room = Arc::new(Room::new(1, 4, 6).unwrap());
        let entry = schedule(Arc::clone(&room));
        let mut ledger = ReservationLedger::default();
        let id = ledger
            .open("U1".into(), entry, committed(&room, &["A1", "B2"]), Utc::now())
            .id()
            .to_string();
        assert_eq!(room.available_count(), 22);

        let record = ledger.cancel(&id, Utc::now()).unwrap();
        assert!(!record.is_active());
        assert!(record.cancelled_at().is_some());
        assert_eq!(room.available_count(), 24);

        assert_eq!(
            ledger.cancel(&id, Utc::now()).unwrap_err(),
            BookingError::AlreadyInactive { id: id.clone() }
        );
        assert_eq!(ledger.active().count(), 0);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_cancel_unknown_reservation() {
        let mut ledger = ReservationLedger::default();
        assert_eq!(
            ledger.cancel("R42", Utc::now()).unwrap_err(),
            BookingError::ReservationNotFound {
                id: "R42".to_string()
            }
        );
    }

    #[test]
    fn test_cancel_survives_externally_freed_seat() {
        let room = Arc::new(Room::new(1, 4, 6).unwrap());
        let entry = schedule(Arc::clone(&room));
        let mut ledger = ReservationLedger::default();
        let seats = committed(&room, &["A1", "A2"]);
        let id = ledger
            .open("U1".into(), entry, seats, Utc::now())
            .id()
            .to_string();

        // Corrupt the grid behind the ledger's back
        room.release(SeatLabel::parse("A1").unwrap().position());

        assert!(ledger.cancel(&id, Utc::now()).is_ok());
        assert_eq!(room.available_count(), 24);
    }
}

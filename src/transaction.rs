use crate::error::{BookingError, Result};
use crate::seat_grid::SeatGrid;
use crate::types::{SeatLabel, SeatPosition};
use parking_lot::RwLockWriteGuard;
use tracing::{debug, error};

/// An all-or-nothing reservation over one room's grid.
///
/// Every successful [`SeatGrid::reserve`] is pushed onto a compensating stack.
/// If a later seat fails, or if the transaction is dropped before
/// [`commit`](SeatTransaction::commit), every pushed seat is released again, so
/// no partial reservation outlives the transaction.
///
/// The grid's write lock is held for the transaction's whole lifetime.
///
/// ## Examples
///
/// ```
/// use cinema_booking::{BookingError, Room, SeatLabel};
///
/// let room = Room::new(1, 4, 6).unwrap();
/// room.reserve(SeatLabel::parse("B2").unwrap().position());
///
/// let seats: Vec<SeatLabel> = ["A1", "A2", "B2"]
///     .iter()
///     .map(|label| SeatLabel::parse(label).unwrap())
///     .collect();
///
/// let mut transaction = room.begin_transaction();
/// let result = transaction.reserve_all(&seats);
/// drop(transaction);
///
/// assert_eq!(
///     result,
///     Err(BookingError::SeatUnavailable { label: "B2".to_string() })
/// );
/// // A1 and A2 were rolled back
/// assert_eq!(room.available_count(), 23);
/// ```
pub struct SeatTransaction<'a> {
    room_number: u32,
    grid: RwLockWriteGuard<'a, SeatGrid>,
    applied: Vec<SeatPosition>,
}

impl<'a> SeatTransaction<'a> {
    pub(crate) fn new(room_number: u32, grid: RwLockWriteGuard<'a, SeatGrid>) -> Self {
        SeatTransaction {
            room_number,
            grid,
            applied: Vec::new(),
        }
    }

    /// Reserves one seat as part of the transaction.
    ///
    /// ## Errors
    ///
    /// [`BookingError::SeatUnavailable`] if the seat is out of bounds or
    /// already occupied, including by an earlier seat of this same
    /// transaction. Seats reserved earlier stay pending; the caller decides
    /// whether to roll back.
    pub fn reserve(&mut self, seat: &SeatLabel) -> Result<()> {
        let position = seat.position();
        if !self.grid.reserve(position) {
            return Err(BookingError::SeatUnavailable {
                label: seat.as_str().to_string(),
            });
        }

        self.applied.push(position);
        Ok(())
    }

    /// Reserves the seats in order, stopping at the first unavailable one.
    ///
    /// ## Errors
    ///
    /// [`BookingError::SeatUnavailable`] naming the first seat that could not
    /// be reserved. Everything this transaction reserved so far is rolled back
    /// before returning.
    pub fn reserve_all(&mut self, seats: &[SeatLabel]) -> Result<()> {
        for seat in seats {
            if let Err(error) = self.reserve(seat) {
                self.rollback();
                return Err(error);
            }
        }
        Ok(())
    }

    /// Number of seats reserved by this transaction and not yet rolled back.
    pub fn pending(&self) -> usize {
        self.applied.len()
    }

    /// Releases every seat reserved by this transaction.
    pub fn rollback(&mut self) {
        // Cells are independent, so unwinding order does not matter
        while let Some(position) = self.applied.pop() {
            if self.grid.release(position) {
                debug!(
                    room = self.room_number,
                    row = position.row,
                    column = position.column,
                    "rolled back seat"
                );
            } else {
                error!(
                    room = self.room_number,
                    row = position.row,
                    column = position.column,
                    "seat reserved by this transaction was already free on rollback"
                );
            }
        }
    }

    /// Makes the reservations permanent and releases the grid lock.
    ///
    /// ## Returns
    ///
    /// The number of seats committed.
    pub fn commit(mut self) -> usize {
        let committed = self.applied.len();
        self.applied.clear();
        committed
    }
}

impl Drop for SeatTransaction<'_> {
    fn drop(&mut self) {
        if !self.applied.is_empty() {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::seat_grid::Room;
    use crate::types::{SeatLabel, SeatPosition};
    use crate::BookingError;

    fn seats(labels: &[&str]) -> Vec<SeatLabel> {
        labels
            .iter()
            .map(|label| SeatLabel::parse(label).unwrap())
            .collect()
    }

    #[test]
    fn test_commit_keeps_seats() {
        let room = Room::new(1, 4, 6).unwrap();
        let mut transaction = room.begin_transaction();
        transaction.reserve_all(&seats(&["A1", "B2"])).unwrap();
        assert_eq!(transaction.commit(), 2);
        assert_eq!(room.available_count(), 22);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let room = Room::new(1, 4, 6).unwrap();
        {
            let mut transaction = room.begin_transaction();
            transaction.reserve_all(&seats(&["A1", "B2", "C3"])).unwrap();
            assert_eq!(transaction.pending(), 3);
        }
        assert_eq!(room.available_count(), 24);
    }

    #[test]
    fn test_duplicate_seat_rolls_back_first_occurrence() {
        let room = Room::new(1, 4, 6).unwrap();
        let mut transaction = room.begin_transaction();
        let result = transaction.reserve_all(&seats(&["A1", "a1"]));
        assert_eq!(
            result,
            Err(BookingError::SeatUnavailable {
                label: "a1".to_string()
            })
        );
        assert_eq!(transaction.pending(), 0);
        drop(transaction);
        assert_eq!(room.available_count(), 24);
    }

    #[test]
    fn test_rollback_survives_seat_freed_underneath() {
        let room = Room::new(1, 4, 6).unwrap();
        let mut transaction = room.begin_transaction();
        transaction.reserve_all(&seats(&["A1", "B2"])).unwrap();

        // Free A1 behind the transaction's back
        assert!(transaction.grid.release(SeatPosition::new(0, 0)));

        transaction.rollback();
        assert_eq!(transaction.pending(), 0);
        drop(transaction);
        assert_eq!(room.available_count(), 24);
    }

    #[test]
    fn test_rollback_leaves_foreign_seats_alone() {
        let room = Room::new(1, 4, 6).unwrap();
        room.reserve(SeatLabel::parse("C1").unwrap().position());

        let mut transaction = room.begin_transaction();
        let result = transaction.reserve_all(&seats(&["A1", "B1", "C1", "D1"]));
        assert!(result.is_err());
        drop(transaction);

        // Only the seat held before the transaction remains occupied
        assert_eq!(room.available_count(), 23);
        assert_eq!(
            room.grid().is_occupied(SeatLabel::parse("C1").unwrap().position()),
            Some(true)
        );
    }
}

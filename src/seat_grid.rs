use crate::error::{BookingError, Result};
use crate::transaction::SeatTransaction;
use crate::types::{Occupancy, SeatPosition};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;

/// A fixed-size occupancy matrix, `true` meaning occupied.
///
/// The dimensions never change after construction and every access is
/// bounds-checked: a coordinate outside `[0, rows) x [0, columns)` is reported
/// as a failed operation and never touches the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatGrid {
    rows: usize,
    columns: usize,
    /// Row-major cells
    cells: Vec<bool>,
}

impl SeatGrid {
    /// Creates a grid with every seat free.
    ///
    /// ## Errors
    ///
    /// [`BookingError::InvalidRoomSize`] if `rows * columns` overflows or the
    /// cells cannot be allocated.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        let invalid = || BookingError::InvalidRoomSize { rows, columns };
        let capacity = rows.checked_mul(columns).ok_or_else(invalid)?;

        let mut cells = Vec::new();
        cells.try_reserve_exact(capacity).map_err(|_| invalid())?;
        cells.resize(capacity, false);

        Ok(SeatGrid {
            rows,
            columns,
            cells,
        })
    }

    /// Number of rows, lettered from `A`.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of seats per row, numbered from 1.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of seats.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn cell_index(&self, position: SeatPosition) -> Option<usize> {
        let row = usize::try_from(position.row).ok()?;
        let column = usize::try_from(position.column).ok()?;
        (row < self.rows && column < self.columns).then(|| row * self.columns + column)
    }

    /// Marks a free seat as occupied.
    ///
    /// ## Returns
    ///
    /// `true` if the seat was in bounds and free, in which case it is now
    /// occupied. `false` otherwise, with the grid left untouched.
    ///
    /// ## Examples
    ///
    /// ```
    /// use cinema_booking::{SeatGrid, SeatPosition};
    ///
    /// let mut grid = SeatGrid::new(4, 6).unwrap();
    /// assert!(grid.reserve(SeatPosition::new(0, 0)));
    /// assert!(!grid.reserve(SeatPosition::new(0, 0)));
    /// assert!(!grid.reserve(SeatPosition::new(25, 8)));
    /// assert_eq!(grid.available_count(), 23);
    /// ```
    pub fn reserve(&mut self, position: SeatPosition) -> bool {
        match self.cell_index(position) {
            Some(index) if !self.cells[index] => {
                self.cells[index] = true;
                true
            }
            _ => false,
        }
    }

    /// Frees an occupied seat.
    ///
    /// ## Returns
    ///
    /// `true` if the seat was in bounds and occupied, in which case it is now
    /// free. `false` otherwise, with the grid left untouched.
    pub fn release(&mut self, position: SeatPosition) -> bool {
        match self.cell_index(position) {
            Some(index) if self.cells[index] => {
                self.cells[index] = false;
                true
            }
            _ => false,
        }
    }

    /// Returns whether a seat is occupied, or `None` if it is out of bounds.
    pub fn is_occupied(&self, position: SeatPosition) -> Option<bool> {
        self.cell_index(position).map(|index| self.cells[index])
    }

    /// Counts the free seats. This is $O(R \cdot C)$.
    pub fn available_count(&self) -> usize {
        self.cells.iter().filter(|occupied| !**occupied).count()
    }

    /// Occupied versus total seats.
    pub fn occupancy(&self) -> Occupancy {
        let total = self.capacity();
        Occupancy {
            occupied: total - self.available_count(),
            total,
        }
    }
}

/// Renders the grid with column numbers on top and row letters on the left,
/// `O` for a free seat and `X` for an occupied one.
impl fmt::Display for SeatGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = (1..=self.columns).map(|column| column.to_string()).collect();
        write!(f, "   {}", header.join(" "))?;

        for row in 0..self.rows {
            let cells = &self.cells[row * self.columns..(row + 1) * self.columns];
            let letter = u32::try_from(row)
                .ok()
                .and_then(|row| char::from_u32(u32::from('A') + row))
                .unwrap_or('?');
            let seats: Vec<&str> = cells
                .iter()
                .map(|occupied| if *occupied { "X" } else { "O" })
                .collect();
            write!(f, "\n{} {}", letter, seats.join(" "))?;
        }

        Ok(())
    }
}

/// A physical room and its seat grid.
///
/// Rooms are shared (`Arc<Room>`) by every showtime screening in them. The grid
/// is guarded by a single `RwLock`, and a [`SeatTransaction`] holds its write
/// lock for a whole seat list, so concurrent reservations against the same room
/// are serialized and each one stays all-or-nothing.
#[derive(Debug)]
pub struct Room {
    number: u32,
    grid: RwLock<SeatGrid>,
}

impl Room {
    /// Creates a room with an empty `rows` x `columns` grid.
    ///
    /// ## Errors
    ///
    /// [`BookingError::InvalidRoomSize`], see [`SeatGrid::new`].
    pub fn new(number: u32, rows: usize, columns: usize) -> Result<Self> {
        Ok(Room {
            number,
            grid: RwLock::new(SeatGrid::new(rows, columns)?),
        })
    }

    /// Room number, unique within a cinema.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Number of rows of the grid.
    pub fn rows(&self) -> usize {
        self.grid.read().rows()
    }

    /// Number of columns of the grid.
    pub fn columns(&self) -> usize {
        self.grid.read().columns()
    }

    /// Acquires a read lock on the grid.
    pub fn grid(&self) -> RwLockReadGuard<'_, SeatGrid> {
        self.grid.read()
    }

    /// Acquires the write lock on the grid for the lifetime of the guard.
    pub fn grid_mut(&self) -> RwLockWriteGuard<'_, SeatGrid> {
        self.grid.write()
    }

    /// Opens an all-or-nothing reservation over this room's grid.
    ///
    /// The grid's write lock is held until the transaction is committed or
    /// dropped.
    pub fn begin_transaction(&self) -> SeatTransaction<'_> {
        SeatTransaction::new(self.number, self.grid.write())
    }

    /// Reserves a single seat, see [`SeatGrid::reserve`].
    pub fn reserve(&self, position: SeatPosition) -> bool {
        self.grid.write().reserve(position)
    }

    /// Releases a single seat, see [`SeatGrid::release`].
    pub fn release(&self, position: SeatPosition) -> bool {
        self.grid.write().release(position)
    }

    /// Counts the free seats under a read lock.
    pub fn available_count(&self) -> usize {
        self.grid.read().available_count()
    }

    /// Occupied versus total seats under a read lock.
    pub fn occupancy(&self) -> Occupancy {
        self.grid.read().occupancy()
    }
}

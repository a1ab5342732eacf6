use crate::config::CinemaConfig;
use crate::error::{BookingError, Result};
use crate::ledger::{ReservationLedger, ReservationRecord};
use crate::ordered_index::OrderedIndex;
use crate::registry::{MovieCatalog, User, UserRegistry};
use crate::seat_grid::Room;
use crate::types::{Movie, Occupancy, ScheduleEntry, SeatLabel};
use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The booking service: owns the catalog, the users, the rooms, the showtime
/// index and the reservation ledger.
///
/// All state lives in this value and is dropped with it. Mutating operations
/// take `&mut self`; only the rooms are shared, between the showtimes that
/// screen in them.
///
/// ## Examples
///
/// ```
/// use cinema_booking::{Cinema, CinemaConfig, Movie};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut cinema = Cinema::new(CinemaConfig::default());
/// cinema.add_movie(Movie::new("P1", "Avengers", "Action", 150)).unwrap();
/// cinema.add_room(1, 4, 6).unwrap();
///
/// let starts_at = NaiveDate::from_ymd_opt(2024, 5, 1)
///     .unwrap()
///     .and_hms_opt(20, 0, 0)
///     .unwrap();
/// cinema
///     .schedule_showtime("F1", "P1", 1, starts_at, Decimal::new(100, 1))
///     .unwrap();
/// cinema.register_user("Ana", "ana@example.com").unwrap();
///
/// let record = cinema
///     .reserve_seats("ana@example.com", "F1", &["A1", "B2"])
///     .unwrap();
/// assert_eq!(record.total(), Decimal::new(200, 1));
/// assert_eq!(cinema.room_occupancy(1).unwrap().available(), 22);
///
/// assert!(cinema.cancel_reservation(record.id()));
/// assert!(!cinema.cancel_reservation(record.id()));
/// ```
#[derive(Debug)]
pub struct Cinema {
    config: CinemaConfig,
    movies: MovieCatalog,
    users: UserRegistry,
    rooms: BTreeMap<u32, Arc<Room>>,
    schedules: OrderedIndex<ScheduleEntry>,
    ledger: ReservationLedger,
}

impl Cinema {
    /// Creates an empty cinema.
    pub fn new(config: CinemaConfig) -> Self {
        Cinema {
            movies: MovieCatalog::new(),
            users: UserRegistry::new(config.user_prefix.clone()),
            rooms: BTreeMap::new(),
            schedules: OrderedIndex::new(),
            ledger: ReservationLedger::new(config.reservation_prefix.clone()),
            config,
        }
    }

    /// Creates a cinema stocked with demo data: three movies, a 4x6 room 1, a
    /// 5x8 room 2, and three showtimes starting 2 hours, 4 hours and 1 day
    /// after `now`.
    pub fn seeded(config: CinemaConfig, now: NaiveDateTime) -> Result<Self> {
        let mut cinema = Self::new(config);

        cinema.add_movie(Movie::new("P1", "Avengers", "Action", 150))?;
        cinema.add_movie(Movie::new("P2", "Toy Story", "Animation", 100))?;
        cinema.add_movie(Movie::new("P3", "The Lion King", "Animation", 118))?;

        cinema.add_room(1, 4, 6)?;
        cinema.add_room(2, 5, 8)?;

        cinema.schedule_showtime("F1", "P1", 1, now + Duration::hours(2), Decimal::new(100, 1))?;
        cinema.schedule_showtime("F2", "P2", 2, now + Duration::hours(4), Decimal::new(85, 1))?;
        cinema.schedule_showtime("F3", "P3", 1, now + Duration::days(1), Decimal::new(90, 1))?;

        Ok(cinema)
    }

    pub fn config(&self) -> &CinemaConfig {
        &self.config
    }

    // Catalog

    pub fn add_movie(&mut self, movie: Movie) -> Result<Arc<Movie>> {
        self.movies.add(movie)
    }

    pub fn movie(&self, id: &str) -> Option<&Arc<Movie>> {
        self.movies.get(id)
    }

    /// Movies in id order.
    pub fn movies(&self) -> impl Iterator<Item = &Arc<Movie>> {
        self.movies.iter()
    }

    /// Adds a room with every seat free.
    ///
    /// ## Errors
    ///
    /// - [`BookingError::DuplicateRoom`] if the number is already taken
    /// - [`BookingError::InvalidRoomSize`] if the grid cannot be allocated
    pub fn add_room(&mut self, number: u32, rows: usize, columns: usize) -> Result<Arc<Room>> {
        if self.rooms.contains_key(&number) {
            return Err(BookingError::DuplicateRoom { number });
        }

        let room = Arc::new(Room::new(number, rows, columns)?);
        self.rooms.insert(number, Arc::clone(&room));
        Ok(room)
    }

    /// Looks up a room by number.
    pub fn room(&self, number: u32) -> Option<&Arc<Room>> {
        self.rooms.get(&number)
    }

    /// Rooms in number order.
    pub fn rooms(&self) -> impl Iterator<Item = &Arc<Room>> {
        self.rooms.values()
    }

    // Schedule

    /// Inserts a showtime into the chronological index.
    pub fn insert_schedule(&mut self, entry: Arc<ScheduleEntry>) {
        debug!(
            schedule = entry.id(),
            starts_at = %entry.starts_at(),
            "showtime scheduled"
        );
        self.schedules.insert(entry);
    }

    /// Builds a showtime from catalog ids and inserts it.
    ///
    /// ## Errors
    ///
    /// [`BookingError::UnknownMovie`] or [`BookingError::UnknownRoom`] if
    /// either id is not registered.
    pub fn schedule_showtime(
        &mut self,
        id: &str,
        movie_id: &str,
        room_number: u32,
        starts_at: NaiveDateTime,
        unit_price: Decimal,
    ) -> Result<Arc<ScheduleEntry>> {
        let movie = self
            .movies
            .get(movie_id)
            .cloned()
            .ok_or_else(|| BookingError::UnknownMovie {
                id: movie_id.to_string(),
            })?;
        let room = self
            .rooms
            .get(&room_number)
            .cloned()
            .ok_or(BookingError::UnknownRoom {
                number: room_number,
            })?;

        let entry = Arc::new(ScheduleEntry::new(id, movie, room, starts_at, unit_price));
        self.insert_schedule(Arc::clone(&entry));
        Ok(entry)
    }

    /// Every showtime, earliest first. Showtimes starting at the same time
    /// keep their insertion order.
    pub fn all_schedules_in_order(&self) -> Vec<Arc<ScheduleEntry>> {
        self.schedules.in_order()
    }

    /// Finds a showtime by id.
    ///
    /// This scans the chronological sequence, so it costs $O(N)$ and, should
    /// two showtimes share an id, returns the one starting first.
    pub fn find_schedule(&self, id: &str) -> Option<Arc<ScheduleEntry>> {
        self.schedules
            .iter()
            .find(|entry| entry.id() == id)
            .cloned()
    }

    // Users

    /// Registers a user, see [`UserRegistry::register`].
    pub fn register_user(&mut self, name: &str, email: &str) -> Result<&User> {
        let user = self.users.register(name, email)?;
        info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Looks up a user by e-mail.
    pub fn user(&self, email: &str) -> Option<&User> {
        self.users.get(email)
    }

    // Reservations

    /// Reserves seats for a showtime, all or nothing.
    ///
    /// The holder is resolved first, then the showtime, then every seat label
    /// is decoded. Only then are the seats reserved, in the order given, under
    /// the room's write lock. If any seat is out of bounds or taken, including
    /// by an earlier label of the same request, every seat reserved by this
    /// call is released before the error is returned.
    ///
    /// An empty seat list is accepted and yields a zero-total reservation.
    ///
    /// ## Errors
    ///
    /// - [`BookingError::HolderNotFound`] if no user has this e-mail
    /// - [`BookingError::ScheduleNotFound`] if no showtime has this id
    /// - [`BookingError::InvalidSeatLabel`] if a label cannot be decoded
    /// - [`BookingError::SeatUnavailable`] naming the first seat that could
    ///   not be reserved
    pub fn reserve_seats<S: AsRef<str>>(
        &mut self,
        email: &str,
        schedule_id: &str,
        labels: &[S],
    ) -> Result<ReservationRecord> {
        self.try_reserve_seats(email, schedule_id, labels)
            .inspect_err(|error| {
                warn!(email, schedule = schedule_id, %error, "reservation rejected");
            })
    }

    fn try_reserve_seats<S: AsRef<str>>(
        &mut self,
        email: &str,
        schedule_id: &str,
        labels: &[S],
    ) -> Result<ReservationRecord> {
        let holder = self
            .users
            .get(email)
            .ok_or_else(|| BookingError::HolderNotFound {
                email: email.to_string(),
            })?
            .id
            .clone();

        let schedule = self
            .find_schedule(schedule_id)
            .ok_or_else(|| BookingError::ScheduleNotFound {
                id: schedule_id.to_string(),
            })?;

        let seats = labels
            .iter()
            .map(|label| SeatLabel::parse(label.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        {
            let mut transaction = schedule.room().begin_transaction();
            transaction.reserve_all(&seats)?;
            transaction.commit();
        }

        let record = self
            .ledger
            .open(holder, schedule, seats, Utc::now())
            .clone();
        self.users
            .attach_reservation(email, record.id().to_string())?;

        info!(
            reservation = record.id(),
            holder = record.holder(),
            schedule = schedule_id,
            seats = record.seats().len(),
            total = %record.total(),
            "reservation created"
        );
        Ok(record)
    }

    /// Cancels a reservation and frees its seats.
    ///
    /// ## Errors
    ///
    /// [`BookingError::ReservationNotFound`] or
    /// [`BookingError::AlreadyInactive`].
    pub fn cancel(&mut self, reservation_id: &str) -> Result<ReservationRecord> {
        self.ledger
            .cancel(reservation_id, Utc::now())
            .cloned()
    }

    /// Cancels a reservation, reporting only whether anything was cancelled.
    ///
    /// ## Returns
    ///
    /// `false` if the reservation does not exist or was already cancelled.
    pub fn cancel_reservation(&mut self, reservation_id: &str) -> bool {
        match self.cancel(reservation_id) {
            Ok(_) => true,
            Err(error) => {
                debug!(reservation = reservation_id, %error, "cancellation refused");
                false
            }
        }
    }

    /// Looks up a reservation by id, cancelled ones included.
    pub fn reservation(&self, id: &str) -> Option<&ReservationRecord> {
        self.ledger.get(id)
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    /// Occupied versus total seats of a room, across all its showtimes.
    ///
    /// ## Errors
    ///
    /// [`BookingError::UnknownRoom`] if no room has this number.
    pub fn room_occupancy(&self, number: u32) -> Result<Occupancy> {
        self.rooms
            .get(&number)
            .map(|room| room.occupancy())
            .ok_or(BookingError::UnknownRoom { number })
    }
}

impl Default for Cinema {
    fn default() -> Self {
        Self::new(CinemaConfig::default())
    }
}

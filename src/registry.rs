use crate::error::{BookingError, Result};
use crate::types::{Movie, MovieId, ReservationId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Movies available for scheduling, listed by id.
#[derive(Debug, Default)]
pub struct MovieCatalog {
    movies: BTreeMap<MovieId, Arc<Movie>>,
}

impl MovieCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a movie to the catalog.
    ///
    /// ## Errors
    ///
    /// [`BookingError::DuplicateMovie`] if the id is already taken.
    pub fn add(&mut self, movie: Movie) -> Result<Arc<Movie>> {
        if self.movies.contains_key(&movie.id) {
            return Err(BookingError::DuplicateMovie { id: movie.id });
        }

        let movie = Arc::new(movie);
        self.movies.insert(movie.id.clone(), Arc::clone(&movie));
        Ok(movie)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Movie>> {
        self.movies.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Movie>> {
        self.movies.values()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Reservations made by this user, oldest first
    pub reservations: Vec<ReservationId>,
}

/// Users keyed by e-mail.
///
/// The e-mail is the login key: it must be unique, and reservations are
/// requested by e-mail.
#[derive(Debug)]
pub struct UserRegistry {
    prefix: String,
    next_sequence: u64,
    users: HashMap<String, User>,
}

impl UserRegistry {
    /// Creates an empty registry whose user ids start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        UserRegistry {
            prefix: prefix.into(),
            next_sequence: 1,
            users: HashMap::new(),
        }
    }

    /// Registers a new user under a fresh id.
    ///
    /// ## Errors
    ///
    /// [`BookingError::DuplicateEmail`] if the e-mail is already registered.
    /// No id is consumed in that case.
    pub fn register(&mut self, name: &str, email: &str) -> Result<&User> {
        if self.users.contains_key(email) {
            return Err(BookingError::DuplicateEmail {
                email: email.to_string(),
            });
        }

        let id = format!("{}{}", self.prefix, self.next_sequence);
        self.next_sequence += 1;

        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            reservations: Vec::new(),
        };
        Ok(self.users.entry(email.to_string()).or_insert(user))
    }

    pub fn get(&self, email: &str) -> Option<&User> {
        self.users.get(email)
    }

    /// Appends a reservation to a user's history.
    ///
    /// ## Errors
    ///
    /// [`BookingError::HolderNotFound`] if no user has this e-mail.
    pub fn attach_reservation(&mut self, email: &str, reservation: ReservationId) -> Result<()> {
        let user = self
            .users
            .get_mut(email)
            .ok_or_else(|| BookingError::HolderNotFound {
                email: email.to_string(),
            })?;
        user.reservations.push(reservation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new("U")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_is_rejected() {
        let mut users = UserRegistry::default();
        assert_eq!(users.register("Ana", "ana@example.com").unwrap().id, "U1");
        assert_eq!(
            users.register("Ana Again", "ana@example.com"),
            Err(BookingError::DuplicateEmail {
                email: "ana@example.com".to_string()
            })
        );
        assert_eq!(users.register("Luis", "luis@example.com").unwrap().id, "U2");
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_attach_reservation_to_unknown_user() {
        let mut users = UserRegistry::default();
        assert_eq!(
            users.attach_reservation("ghost@example.com", "R1".to_string()),
            Err(BookingError::HolderNotFound {
                email: "ghost@example.com".to_string()
            })
        );
    }

    #[test]
    fn test_catalog_lists_movies_by_id() {
        let mut catalog = MovieCatalog::new();
        catalog
            .add(Movie::new("P2", "Toy Story", "Animation", 100))
            .unwrap();
        catalog
            .add(Movie::new("P1", "Avengers", "Action", 150))
            .unwrap();

        let titles: Vec<&str> = catalog.iter().map(|movie| movie.title.as_str()).collect();
        assert_eq!(titles, vec!["Avengers", "Toy Story"]);
        assert!(matches!(
            catalog.add(Movie::new("P1", "Duplicate", "Drama", 90)),
            Err(BookingError::DuplicateMovie { .. })
        ));
    }
}

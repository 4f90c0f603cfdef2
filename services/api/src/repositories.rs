//! Repositories for database operations
//!
//! Every store is an async trait with a PostgreSQL implementation. Guarded
//! writes are single conditional statements: a `None` result means the guard
//! did not hold and nothing was written.

pub mod matches;
pub mod message;
pub mod notification;
pub mod photo;
pub mod preference;
pub mod profile;
pub mod profile_photo;
pub mod rating;
pub mod session;
pub mod user;

#[cfg(test)]
pub mod memory;

pub use matches::{Acceptance, MatchRepository, PgMatchRepository};
pub use message::{MessageRepository, PgMessageRepository};
pub use notification::{NotificationRepository, PgNotificationRepository};
pub use photo::{PgPhotoRepository, PhotoRepository};
pub use preference::{PgPreferenceRepository, PreferenceRepository};
pub use profile::{PgProfileRepository, ProfileRepository};
pub use profile_photo::{PgProfilePhotoRepository, ProfilePhotoRepository};
pub use rating::{PgRatingRepository, RatingRepository};
pub use session::{PgSessionRepository, SessionRepository};
pub use user::{PgUserRepository, UserRepository};

/// Parse a text column into one of the closed model enums
fn parse_column<T>(row: &sqlx::postgres::PgRow, column: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr<Err = crate::models::ParseEnumError>,
{
    use sqlx::Row;

    let value: String = row.try_get(column)?;
    Ok(value.parse::<T>()?)
}

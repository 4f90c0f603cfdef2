//! Business operations behind the HTTP routes
//!
//! Services hold their repositories as trait objects and return `ApiResult`,
//! so handlers only translate between HTTP and these calls.

pub mod badges;
pub mod lifecycle;
pub mod matches;
pub mod messaging;
pub mod notifications;
pub mod photos;
pub mod preferences;
pub mod profile_photos;
pub mod profiles;
pub mod ratings;

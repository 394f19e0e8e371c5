//! SeaORM entities. Enumerations are stored as their lower-case string form
//! and parsed back in [`super::mapper`].

pub mod access_request;
pub mod invitation;
pub mod membership;
pub mod notification;
pub mod user;
pub mod workspace;

pub mod client;
pub mod error;
pub mod model;

pub use client::WorkspaceAccessApi;
pub use error::WorkspaceAccessError;
pub use model::*;

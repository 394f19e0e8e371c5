pub mod error;
pub mod events;
pub mod ports;
pub mod rbac;
pub mod repo;
pub mod secrets;
pub mod service;

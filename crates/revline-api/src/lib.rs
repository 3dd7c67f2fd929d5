pub mod auth;
pub mod builds;
pub mod businesses;
pub mod error;
pub mod events;
pub mod extract;
pub mod follows;
pub mod middleware;
pub mod uploads;
pub mod users;

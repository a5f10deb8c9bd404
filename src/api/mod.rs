pub mod feeds;
pub mod health;
pub mod routes;
pub mod subscriptions;

pub use routes::routes;

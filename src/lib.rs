pub mod api;
pub mod cache;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod notify;
pub mod podcast;
pub mod schema;
pub mod store;
pub mod tasks;
#[cfg(test)]
pub mod test_helpers;

// Type definitions
use actix_web::web;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type RqDbPool = web::Data<DbPool>;
pub type RqStore = web::Data<store::PodcastStore>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/migrations");

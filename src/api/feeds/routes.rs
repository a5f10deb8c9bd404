use super::handlers;
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/feeds")
        .service(handlers::get_feed_channels)
        .service(handlers::get_tracked_count)
        .service(handlers::reset_posted)
}

use super::handlers;
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/subscriptions")
        .service(handlers::create_subscription)
        .service(handlers::get_subscriptions)
        .service(handlers::delete_subscription)
}

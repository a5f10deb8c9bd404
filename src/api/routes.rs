use super::{feeds, subscriptions};
use actix_web::{web, Scope};

pub fn routes() -> Scope {
    web::scope("/api")
        .service(subscriptions::routes())
        .service(feeds::routes())
}

pub mod auth;
pub mod notes;

use actix_web::web;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").configure(auth::create_routes))
        .service(web::scope("/notes").configure(notes::create_routes));
}

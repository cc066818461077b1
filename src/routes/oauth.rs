use actix_web::web;

use crate::handlers::auth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/oauth/google")
            .route("/login", web::get().to(auth::google_login))
            .route("/callback", web::get().to(auth::google_callback)),
    );
}

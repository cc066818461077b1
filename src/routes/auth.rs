use actix_web::web;

use crate::handlers::auth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/authentication")
            .route("/user", web::post().to(auth::register))
            .route("/user", web::get().to(auth::me))
            .route("/token", web::post().to(auth::login))
            .route("/refresh", web::post().to(auth::refresh))
            .route("/activate", web::post().to(auth::activate))
            .route(
                "/resend-invitation",
                web::post().to(auth::resend_invitation),
            ),
    );
}

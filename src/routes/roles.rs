use actix_web::web;

use crate::handlers::roles;

/// Mounted under `/restaurants/{restaurant_id}/roles`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/roles")
            .route("", web::post().to(roles::create))
            .route("", web::get().to(roles::list))
            .service(
                web::scope("/{role_id}")
                    .route("", web::put().to(roles::update))
                    .route("", web::delete().to(roles::delete))
                    .route("/employees", web::get().to(roles::list_employees)),
            ),
    );
}

use actix_web::web;

use crate::handlers::employees;

/// Mounted under `/restaurants/{restaurant_id}/employees`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            .route("", web::post().to(employees::create))
            .route("", web::get().to(employees::list))
            .service(
                web::scope("/{employee_id}")
                    .route("", web::get().to(employees::get))
                    .route("", web::put().to(employees::update))
                    .route("", web::delete().to(employees::delete))
                    .route("/roles", web::get().to(employees::list_roles))
                    .route(
                        "/roles/{role_id}",
                        web::post().to(employees::grant_role),
                    )
                    .route(
                        "/roles/{role_id}",
                        web::delete().to(employees::revoke_role),
                    ),
            ),
    );
}

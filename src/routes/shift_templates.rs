use actix_web::web;

use crate::handlers::shift_templates;

/// Mounted under `/restaurants/{restaurant_id}/shift-templates`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shift-templates")
            .route("", web::post().to(shift_templates::create))
            .route("", web::get().to(shift_templates::list))
            .service(
                web::scope("/{template_id}")
                    .route("", web::put().to(shift_templates::update))
                    .route("", web::delete().to(shift_templates::delete))
                    .route("/roles", web::get().to(shift_templates::list_roles))
                    .route("/roles", web::put().to(shift_templates::assign_roles)),
            ),
    );
}

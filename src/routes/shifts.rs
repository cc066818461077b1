use actix_web::web;

use crate::handlers::shifts;

/// Mounted under `/restaurants/{restaurant_id}/schedules/{schedule_id}/shifts`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shifts")
            .route("", web::post().to(shifts::create))
            .route("", web::get().to(shifts::list))
            .service(
                web::scope("/{shift_id}")
                    .route("", web::get().to(shifts::get))
                    .route("", web::put().to(shifts::update))
                    .route("", web::delete().to(shifts::delete))
                    .route("/assign", web::post().to(shifts::assign)),
            ),
    );
}

use actix_web::web;

use crate::handlers::schedules;

/// Mounted under `/restaurants/{restaurant_id}/schedules`. `/week` is
/// registered ahead of `/{schedule_id}` so the literal segment wins.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/schedules")
            .route("", web::post().to(schedules::create))
            .route("", web::get().to(schedules::list))
            .route("/week", web::get().to(schedules::week))
            .service(
                web::scope("/{schedule_id}")
                    .route("", web::get().to(schedules::get))
                    .route("", web::delete().to(schedules::delete))
                    .route(
                        "/auto-populate",
                        web::post().to(schedules::auto_populate),
                    )
                    .route("/send-email", web::post().to(schedules::send_email))
                    .configure(crate::routes::shifts::configure),
            ),
    );
}

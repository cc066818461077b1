use actix_web::web;

use crate::handlers::restaurants;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/restaurants")
            .route("", web::post().to(restaurants::create))
            .route("", web::get().to(restaurants::list))
            .service(
                web::scope("/{restaurant_id}")
                    .route("", web::get().to(restaurants::get))
                    .route("", web::put().to(restaurants::update))
                    .route("", web::delete().to(restaurants::delete))
                    .configure(crate::routes::employees::configure)
                    .configure(crate::routes::roles::configure)
                    .configure(crate::routes::shift_templates::configure)
                    .configure(crate::routes::schedules::configure),
            ),
    );
}

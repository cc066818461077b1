use actix_web::web;

pub mod auth;
pub mod employees;
pub mod oauth;
pub mod restaurants;
pub mod roles;
pub mod schedules;
pub mod shift_templates;
pub mod shifts;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .configure(auth::configure)
            .configure(oauth::configure)
            .configure(restaurants::configure),
    );
}

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use resa::auth::{GoogleOAuthVerifier, OAuthVerifier};
use resa::cache::{MokaRestaurantCache, NoopRestaurantCache, RestaurantCache};
use resa::config::Config;
use resa::database::init_database;
use resa::database::repositories::{
    EmployeeRepository, EmployeeRoleRepository, PgEmployeeRepository, PgEmployeeRoleRepository,
    PgRestaurantRepository, PgRoleRepository, PgScheduleRepository, PgScheduledShiftRepository,
    PgShiftTemplateRepository, PgUserInvitationRepository, PgUserRepository, RestaurantRepository,
    RoleRepository, ScheduleRepository, ScheduledShiftRepository, ShiftTemplateRepository,
    UserInvitationRepository, UserRepository,
};
use resa::mailer::{LettreMailer, LoggingMailer, Mailer};
use resa::middleware::{BasicAuthMiddleware, RateLimiter, RequestDeadline, RequestIdMiddleware};
use resa::routes;
use resa::services::{RegistrationSaga, ScheduleService};

#[get("/v1/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("configuration loaded (environment: {})", config.environment);

    let pool = init_database(&config.db).await?;
    log::info!("database initialized");

    let query_timeout = config.db.query_timeout;
    let user_repo: Arc<dyn UserRepository> =
        Arc::new(PgUserRepository::new(pool.clone(), query_timeout));
    let invitation_repo: Arc<dyn UserInvitationRepository> =
        Arc::new(PgUserInvitationRepository::new(pool.clone(), query_timeout));
    let restaurant_repo: Arc<dyn RestaurantRepository> =
        Arc::new(PgRestaurantRepository::new(pool.clone(), query_timeout));
    let role_repo: Arc<dyn RoleRepository> =
        Arc::new(PgRoleRepository::new(pool.clone(), query_timeout));
    let employee_repo: Arc<dyn EmployeeRepository> =
        Arc::new(PgEmployeeRepository::new(pool.clone(), query_timeout));
    let employee_role_repo: Arc<dyn EmployeeRoleRepository> =
        Arc::new(PgEmployeeRoleRepository::new(pool.clone(), query_timeout));
    let shift_template_repo: Arc<dyn ShiftTemplateRepository> =
        Arc::new(PgShiftTemplateRepository::new(pool.clone(), query_timeout));
    let schedule_repo: Arc<dyn ScheduleRepository> =
        Arc::new(PgScheduleRepository::new(pool.clone(), query_timeout));
    let scheduled_shift_repo: Arc<dyn ScheduledShiftRepository> =
        Arc::new(PgScheduledShiftRepository::new(pool.clone(), query_timeout));

    let cache: Arc<dyn RestaurantCache> = if config.cache.enabled {
        Arc::new(MokaRestaurantCache::new(Duration::from_secs(
            config.cache.ttl_secs,
        )))
    } else {
        Arc::new(NoopRestaurantCache)
    };

    let mailer: Arc<dyn Mailer> = if config.is_production() {
        Arc::new(LettreMailer::new(
            &config.mail.smtp_host,
            &config.mail.from_email,
            None,
        ))
    } else {
        Arc::new(LoggingMailer)
    };

    let oauth_verifier: Arc<dyn OAuthVerifier> =
        Arc::new(GoogleOAuthVerifier::new(config.oauth_google.clone()));

    let saga = web::Data::new(RegistrationSaga::new(
        pool.clone(),
        user_repo.clone(),
        invitation_repo.clone(),
        mailer.clone(),
        config.clone(),
    ));
    let schedule_service = web::Data::new(ScheduleService::new(
        schedule_repo.clone(),
        shift_template_repo.clone(),
        scheduled_shift_repo.clone(),
        employee_repo.clone(),
        mailer.clone(),
    ));

    let config_data = web::Data::new(config.clone());
    let user_repo_data = web::Data::new(user_repo);
    let restaurant_repo_data = web::Data::new(restaurant_repo);
    let role_repo_data = web::Data::new(role_repo);
    let employee_repo_data = web::Data::new(employee_repo);
    let employee_role_repo_data = web::Data::new(employee_role_repo);
    let shift_template_repo_data = web::Data::new(shift_template_repo);
    let schedule_repo_data = web::Data::new(schedule_repo);
    let scheduled_shift_repo_data = web::Data::new(scheduled_shift_repo);
    let cache_data = web::Data::new(cache);
    let oauth_verifier_data = web::Data::new(oauth_verifier);
    let oauth_google_config_data = web::Data::new(config.oauth_google.clone());

    let rate_limiter = RateLimiter::new(config.rate_limiter.clone());
    let request_deadline = RequestDeadline::new(config.db.query_timeout);
    let basic_auth = BasicAuthMiddleware::new(config.auth_basic.clone());
    let cors_origin = config.cors_allowed_origin.clone();
    let server_address = config.server_address();

    log::info!("server starting on http://{server_address}");

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(user_repo_data.clone())
            .app_data(restaurant_repo_data.clone())
            .app_data(role_repo_data.clone())
            .app_data(employee_repo_data.clone())
            .app_data(employee_role_repo_data.clone())
            .app_data(shift_template_repo_data.clone())
            .app_data(schedule_repo_data.clone())
            .app_data(scheduled_shift_repo_data.clone())
            .app_data(cache_data.clone())
            .app_data(oauth_verifier_data.clone())
            .app_data(oauth_google_config_data.clone())
            .app_data(saga.clone())
            .app_data(schedule_service.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                    ])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(rate_limiter.clone())
            .wrap(request_deadline.clone())
            .service(health)
            .service(
                web::scope("/v1/docs")
                    .wrap(basic_auth.clone())
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            )
            .configure(routes::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("server error: {e}"))
}

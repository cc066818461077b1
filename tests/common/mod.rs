#![allow(dead_code)]

use resa::auth::jwt;
use resa::cache::{NoopRestaurantCache, RestaurantCache};
use resa::config::Config;
use resa::database::repositories::{
    EmployeeRepository, EmployeeRoleRepository, InMemoryEmployeeRepository,
    InMemoryEmployeeRoleRepository, InMemoryRestaurantRepository, InMemoryRoleRepository,
    InMemoryScheduleRepository, InMemoryScheduledShiftRepository,
    InMemoryShiftTemplateRepository, InMemoryUserInvitationRepository, InMemoryUserRepository,
    NewUser, RestaurantRepository, RoleRepository, ScheduleRepository, ScheduledShiftRepository,
    ShiftTemplateRepository, UserInvitationRepository, UserRepository,
};
use resa::mailer::{LoggingMailer, Mailer};
use resa::services::ScheduleService;
use std::sync::Arc;
use uuid::Uuid;

pub fn test_config() -> Config {
    Config::from_env_only().expect("default config resolves without a .env file")
}

/// All the `Arc<dyn Trait>` wiring a handler test needs, backed entirely by
/// `InMemory*` repositories so no database connection is required.
pub struct TestApp {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub invitation_repo: Arc<dyn UserInvitationRepository>,
    pub restaurant_repo: Arc<dyn RestaurantRepository>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub role_repo: Arc<dyn RoleRepository>,
    pub employee_role_repo: Arc<dyn EmployeeRoleRepository>,
    pub shift_template_repo: Arc<dyn ShiftTemplateRepository>,
    pub schedule_repo: Arc<dyn ScheduleRepository>,
    pub scheduled_shift_repo: Arc<dyn ScheduledShiftRepository>,
    pub cache: Arc<dyn RestaurantCache>,
    pub mailer: Arc<dyn Mailer>,
    pub schedule_service: ScheduleService,
}

impl TestApp {
    pub fn new() -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let invitation_repo: Arc<dyn UserInvitationRepository> =
            Arc::new(InMemoryUserInvitationRepository::new());
        let restaurant_repo: Arc<dyn RestaurantRepository> =
            Arc::new(InMemoryRestaurantRepository::new());
        let employee_role_repo: Arc<dyn EmployeeRoleRepository> =
            Arc::new(InMemoryEmployeeRoleRepository::new());
        let employee_repo: Arc<dyn EmployeeRepository> =
            Arc::new(InMemoryEmployeeRepository::new(employee_role_repo.clone()));
        let role_repo: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::new());
        let shift_template_repo: Arc<dyn ShiftTemplateRepository> =
            Arc::new(InMemoryShiftTemplateRepository::new());
        let schedule_repo: Arc<dyn ScheduleRepository> = Arc::new(InMemoryScheduleRepository::new());
        let scheduled_shift_repo: Arc<dyn ScheduledShiftRepository> =
            Arc::new(InMemoryScheduledShiftRepository::new(
                schedule_repo.clone(),
                employee_repo.clone(),
                employee_role_repo.clone(),
            ));
        let cache: Arc<dyn RestaurantCache> = Arc::new(NoopRestaurantCache::default());
        let mailer: Arc<dyn Mailer> = Arc::new(LoggingMailer::default());

        let schedule_service = ScheduleService::new(
            schedule_repo.clone(),
            shift_template_repo.clone(),
            scheduled_shift_repo.clone(),
            employee_repo.clone(),
            mailer.clone(),
        );

        Self {
            config: test_config(),
            user_repo,
            invitation_repo,
            restaurant_repo,
            employee_repo,
            role_repo,
            employee_role_repo,
            shift_template_repo,
            schedule_repo,
            scheduled_shift_repo,
            cache,
            mailer,
            schedule_service,
        }
    }

    /// Creates an active user directly (bypassing the registration saga,
    /// which requires a live Postgres pool) and returns it with a bearer
    /// token good for the request chain under test.
    pub async fn active_user_with_token(&self, email: &str) -> (Uuid, String) {
        let user = self
            .user_repo
            .create(&NewUser {
                email: email.to_string(),
                password_hash: None,
                first_name: "Test".to_string(),
                last_name: "Owner".to_string(),
                google_id: None,
                avatar_url: None,
                is_active: true,
            })
            .await
            .unwrap();
        let token = jwt::issue(user.id, &self.config.auth_token).unwrap();
        (user.id, token)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {token}"),
    )
}

/// Wires every piece of `app_data` a handler under `/v1/restaurants/...`
/// might ask for, all backed by the `InMemory*` repositories on `$ctx`.
/// Route modules not exercised by a given test (auth, oauth) are still
/// registered by `routes::configure` but never asked to extract their
/// `app_data`, so leaving `RegistrationSaga`/`OAuthVerifier` unwired here
/// is safe.
#[macro_export]
macro_rules! full_app {
    ($ctx:expr) => {
        actix_web::App::new()
            .app_data(actix_web::web::Data::new($ctx.config.clone()))
            .app_data(actix_web::web::Data::new($ctx.user_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.restaurant_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.employee_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.role_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.employee_role_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.shift_template_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.schedule_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.scheduled_shift_repo.clone()))
            .app_data(actix_web::web::Data::new($ctx.cache.clone()))
            .app_data(actix_web::web::Data::new($ctx.schedule_service.clone()))
            .configure(resa::routes::configure)
    };
}

pub mod registration;
pub mod schedule;

pub use registration::RegistrationSaga;
pub use schedule::ScheduleService;

pub mod auth;
pub mod employees;
pub mod restaurants;
pub mod roles;
pub mod schedules;
pub mod shared;
pub mod shift_templates;
pub mod shifts;

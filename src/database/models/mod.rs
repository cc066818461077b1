pub mod auth;
pub mod employee;
pub mod employee_role;
pub mod invitation;
pub mod restaurant;
pub mod role;
pub mod schedule;
pub mod scheduled_shift;
pub mod shift_template;
pub mod user;

pub use auth::*;
pub use employee::*;
pub use employee_role::*;
pub use invitation::*;
pub use restaurant::*;
pub use role::*;
pub use schedule::*;
pub use scheduled_shift::*;
pub use shift_template::*;
pub use user::*;

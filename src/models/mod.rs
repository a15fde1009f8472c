pub mod absence;
pub mod schedule;
pub mod user;

pub use absence::*;
pub use schedule::*;
pub use user::*;

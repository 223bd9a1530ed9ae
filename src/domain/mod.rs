pub mod attendance;
pub mod calendar;
pub mod exam;
pub mod parts;
pub mod roles;
pub mod stage;

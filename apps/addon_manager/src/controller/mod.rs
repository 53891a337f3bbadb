//! Page controllers and the events they turn bridge resolutions into.

pub mod events;
pub mod home;
pub mod orchestration;

pub mod absence;
pub mod employee;
pub mod punch;
pub mod role;
pub mod user;

pub mod absence;
pub mod access;
pub mod employee;
pub mod punch;
pub mod timeclock;

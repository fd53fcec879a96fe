pub mod devices;
pub mod frame;
#[cfg(test)]
pub mod mocks;
pub mod sessions;
pub mod simulated;
pub mod workflow;

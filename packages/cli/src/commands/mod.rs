pub mod agents;
pub mod config;
pub mod create;
pub mod process;

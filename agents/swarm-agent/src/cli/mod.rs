//! CLI support module
//!
//! Configuration loading for the swarm agent binary.

pub mod config;

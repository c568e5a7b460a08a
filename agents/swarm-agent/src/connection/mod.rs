//! Connection module
//!
//! This module handles all communication with the installation service that
//! hands steps to each simulated agent.

pub mod controller;
pub mod protocol;

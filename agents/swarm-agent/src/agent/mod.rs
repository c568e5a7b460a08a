//! Agent module
//!
//! This module contains the simulated agents: their registry, parameters,
//! dispatch loops and the reboot watcher that stops them.

pub mod dispatch;
pub mod params;
pub mod registry;
pub mod state;
pub mod swarm;
pub mod watcher;

//! Runtime module
//!
//! This module turns controller steps into executable runners through the
//! common Runner trait and the step runner factory.

pub mod adapter;
pub mod factory;
pub mod steps;
pub mod validate;

//! Utility functions for the Lightning channel list view

pub mod config;
pub mod env_var;
pub mod log_utils;
pub mod util;

pub use env_var::*;

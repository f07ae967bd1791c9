//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - A fixed-capacity ring buffer for trails
//! - Frame and animation timing
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;

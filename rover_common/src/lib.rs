//! Rover Common Library
//!
//! This crate provides shared constants, configuration loading and the
//! hardware capability traits for all rover workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Drive, steering and capture constants
//! - [`config`] - Configuration loading traits and types
//! - [`hal`] - GPIO driver trait, error and pin types
//! - [`camera`] - Capture device trait and frame types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rover_common::consts::CENTER_ANGLE;
//! use rover_common::config::{ConfigLoader, RoverConfig};
//! ```

pub mod camera;
pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;

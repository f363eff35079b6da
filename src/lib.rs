//! Client library for the Chronicle security log management API
//!
//! - [`resource`] builds resource names and unsent HTTP requests
//! - [`endpoint`] builds the regional service root
//! - [`gcp`] obtains bearer tokens and executes requests
//! - [`config`] holds persisted defaults for the `chronicle` binary

pub mod config;
pub mod endpoint;
pub mod error;
pub mod gcp;
pub mod resource;

pub use error::{Error, Result};

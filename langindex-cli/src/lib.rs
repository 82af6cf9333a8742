//! CLI library for testing purposes

pub mod config;
pub mod host;
pub mod run;
pub mod view;

pub use config::{Overrides, resolve};
pub use host::ArgsHost;

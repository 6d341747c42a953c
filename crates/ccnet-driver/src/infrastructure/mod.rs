//! Infrastructure layer of the driver.
//!
//! Contains the OS-facing adapters: the serial transport (plus its scripted
//! in-memory counterpart) and the TOML configuration loader.
//!
//! The application layer depends only on the [`transport::Transport`] trait
//! and the plain settings types defined here, never on `serialport` itself.

pub mod config;
pub mod transport;

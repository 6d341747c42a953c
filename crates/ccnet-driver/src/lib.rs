//! ccnet-driver library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;

pub use application::poll_events::ValidatorEvents;
pub use application::validator::{BillValidator, BillValidatorBuilder, DriverError};
pub use infrastructure::config::{load_config, load_config_or_default, DriverConfig};
pub use infrastructure::transport::{PortSettings, Transport, TransportError};

//! HTTP implementation of the Parley message transport.

pub mod config;
pub mod transport;

pub use config::{ClientConfig, ConfigError, DEFAULT_SERVER_URL};
pub use transport::HttpTransport;

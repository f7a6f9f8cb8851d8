//! examkit-client: backend integrations.
//!
//! Implements the `ExamBackend` trait over the exam server's HTTP API and
//! in process memory, plus the configuration that selects between them.

pub mod config;
pub mod http;
pub mod memory;

pub use config::{create_backend, load_config, load_config_from, BackendConfig, ExamkitConfig};
pub use http::HttpBackend;
pub use memory::InMemoryBackend;

pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, load_config_or_default, resolve_config_path};
pub use run::run_app;
pub use wiring::{wire_dependencies, HostAdapters, WiringError};

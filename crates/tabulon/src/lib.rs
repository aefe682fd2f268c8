//! Tabulon - datapackage store and execution
//!
//! Shared functionality for the `tabulon` binary: locating resources,
//! templates and argument spaces inside a datapackage directory, persisting
//! reconciled resources, and running algorithm and view containers.

pub mod config;
pub mod error;
pub mod execute;
pub mod store;

pub use config::{resolve_base_path, Config, BASE_PATH_ENV, CONFIG_FILE};
pub use error::{DatapackageError, Result};
pub use execute::{execute_algorithm, execute_view};
pub use store::{AlgorithmRecord, Datapackage, ViewRecord, DEFAULT_ARGUMENT_SPACE};

//! Running algorithms and views
//!
//! Both are opaque container runs: the datapackage directory is mounted and the
//! container reads and writes resources itself. A view additionally requires
//! every resource it lists to hold data before it is started.

use std::fs;
use tabulon_runner::{ContainerRunner, RunRequest};
use tracing::{info, warn};

use crate::error::{DatapackageError, Result};
use crate::store::Datapackage;

pub const ALGORITHM_ENV: &str = "ALGORITHM";
pub const ARGUMENT_SPACE_ENV: &str = "ARGUMENT_SPACE";
pub const VIEW_ENV: &str = "VIEW";

/// Run an algorithm against one argument space. Returns the captured logs.
pub fn execute_algorithm(
    store: &Datapackage,
    runner: &dyn ContainerRunner,
    algorithm: &str,
    space: &str,
) -> Result<String> {
    let record = store.load_algorithm(algorithm)?;
    let request = RunRequest::new(&record.container, mount_source(store)?)
        .with_env(ALGORITHM_ENV, algorithm)
        .with_env(ARGUMENT_SPACE_ENV, space);

    info!(algorithm, space, image = %record.container, "executing algorithm");
    Ok(runner.run(&request)?)
}

/// Render a view. Fails with [`DatapackageError::ResourceNotPopulated`] before
/// starting anything if a listed resource has no data.
pub fn execute_view(
    store: &Datapackage,
    runner: &dyn ContainerRunner,
    view: &str,
    space: &str,
) -> Result<String> {
    let record = store.load_view(view)?;

    for resource in &record.resources {
        if !store.load_resource_record(resource)?.is_populated() {
            warn!(view, resource = %resource, "view resource is empty");
            return Err(DatapackageError::ResourceNotPopulated {
                view: view.to_string(),
                resource: resource.clone(),
            });
        }
    }

    let request = RunRequest::new(&record.container, mount_source(store)?)
        .with_env(VIEW_ENV, view)
        .with_env(ARGUMENT_SPACE_ENV, space);

    info!(view, space, image = %record.container, "executing view");
    Ok(runner.run(&request)?)
}

/// Container runtimes need an absolute host path for bind mounts.
fn mount_source(store: &Datapackage) -> Result<std::path::PathBuf> {
    fs::canonicalize(store.base_path()).map_err(|e| DatapackageError::io(store.base_path(), e))
}

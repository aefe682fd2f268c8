//! Datapackage directory layout
//!
//! A datapackage is a plain directory:
//!
//! ```text
//! <base>/
//!   datapackage.json               package metadata, `updated` bumped on write
//!   tabulon.toml                   optional runner config
//!   resources/<resource>.json      resource records
//!   templates/<template>.json      field templates
//!   arguments/<algorithm>.<space>.json
//!   algorithms/<algorithm>.json    container + declared argument interfaces
//!   views/<view>.json              container + resources it reads
//! ```
//!
//! The store assumes one writer at a time. There is no locking.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tabulon_schema::{
    find_by_name, Argument, ArgumentInterface, ArgumentSpace, Named, Resource, ResourceRecord,
    Template,
};
use tracing::{debug, info};

use crate::error::{DatapackageError, Result};

pub const RESOURCES_DIR: &str = "resources";
pub const TEMPLATES_DIR: &str = "templates";
pub const ARGUMENTS_DIR: &str = "arguments";
pub const ALGORITHMS_DIR: &str = "algorithms";
pub const VIEWS_DIR: &str = "views";
pub const DATAPACKAGE_FILE: &str = "datapackage.json";
pub const DEFAULT_ARGUMENT_SPACE: &str = "default";

/// `algorithms/<algorithm>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmRecord {
    pub name: String,

    /// Image reference passed to the container runner.
    #[serde(alias = "image")]
    pub container: String,

    #[serde(default)]
    pub arguments: Vec<ArgumentInterface>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlgorithmRecord {
    pub fn interface(&self, argument: &str) -> Option<&ArgumentInterface> {
        find_by_name(&self.arguments, argument)
    }
}

impl Named for AlgorithmRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

/// `views/<view>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub name: String,

    #[serde(alias = "image")]
    pub container: String,

    /// Resources that must be populated before the view can render.
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Handle on a datapackage directory.
#[derive(Debug, Clone)]
pub struct Datapackage {
    base: PathBuf,
}

impl Datapackage {
    pub fn open(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn resource_path(&self, resource: &str) -> PathBuf {
        self.base.join(RESOURCES_DIR).join(format!("{}.json", resource))
    }

    pub fn template_path(&self, template: &str) -> PathBuf {
        self.base.join(TEMPLATES_DIR).join(format!("{}.json", template))
    }

    pub fn argument_space_path(&self, algorithm: &str, space: &str) -> PathBuf {
        self.base
            .join(ARGUMENTS_DIR)
            .join(format!("{}.{}.json", algorithm, space))
    }

    pub fn algorithm_path(&self, algorithm: &str) -> PathBuf {
        self.base.join(ALGORITHMS_DIR).join(format!("{}.json", algorithm))
    }

    pub fn view_path(&self, view: &str) -> PathBuf {
        self.base.join(VIEWS_DIR).join(format!("{}.json", view))
    }

    pub fn datapackage_path(&self) -> PathBuf {
        self.base.join(DATAPACKAGE_FILE)
    }

    // =========================================================================
    // Templates and resources
    // =========================================================================

    pub fn load_template(&self, template: &str) -> Result<Template> {
        self.read_json(&self.template_path(template))
    }

    /// The stored record, without template expansion or alignment.
    pub fn load_resource_record(&self, resource: &str) -> Result<ResourceRecord> {
        let path = self.resource_path(resource);
        if !path.exists() {
            return Err(DatapackageError::ResourceNotFound {
                resource: resource.to_string(),
                path,
            });
        }
        self.read_json(&path)
    }

    /// Load a resource, attaching `template` when given.
    pub fn load_resource(&self, resource: &str, template: Option<&str>) -> Result<Resource> {
        let record = self.load_resource_record(resource)?;
        let template = template.map(|name| self.load_template(name)).transpose()?;
        let loaded = Resource::from_record(record, template)?;
        debug!(
            resource,
            populated = loaded.table().row_count() > 0,
            "loaded resource"
        );
        Ok(loaded)
    }

    /// Write `resource` and bump the datapackage `updated` timestamp.
    ///
    /// Template-derived schemas are written back as the inherit marker.
    pub fn write_resource(&self, resource: &Resource) -> Result<()> {
        self.write_resource_record(&resource.to_record())
    }

    pub fn write_resource_record(&self, record: &ResourceRecord) -> Result<()> {
        self.write_json(&self.resource_path(&record.name), record)?;
        self.touch()?;
        info!(resource = %record.name, rows = record.data.len(), "wrote resource");
        Ok(())
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    pub fn load_argument_space(&self, algorithm: &str, space: &str) -> Result<ArgumentSpace> {
        let mut loaded: ArgumentSpace = self.read_json(&self.argument_space_path(algorithm, space))?;
        if loaded.name.is_empty() {
            loaded.name = space.to_string();
        }
        Ok(loaded)
    }

    pub fn write_argument_space(&self, algorithm: &str, space: &ArgumentSpace) -> Result<()> {
        self.write_json(&self.argument_space_path(algorithm, &space.name), space)?;
        self.touch()
    }

    pub fn load_argument(&self, algorithm: &str, argument: &str, space: &str) -> Result<Argument> {
        let loaded = self.load_argument_space(algorithm, space)?;
        Ok(loaded.argument(argument)?.clone())
    }

    /// Load the resource an argument points at, with the argument's template.
    pub fn load_resource_by_argument(
        &self,
        algorithm: &str,
        argument: &str,
        space: &str,
    ) -> Result<Resource> {
        let arg = self.load_argument(algorithm, argument, space)?;
        let resource = arg
            .resource()
            .ok_or_else(|| DatapackageError::NotAResourceArgument {
                argument: argument.to_string(),
                space: space.to_string(),
            })?;
        self.load_resource(resource, arg.template())
    }

    /// Validate `value` against the algorithm's declared interface, then
    /// persist it into the argument space.
    pub fn set_argument(
        &self,
        algorithm: &str,
        space: &str,
        argument: &str,
        value: Value,
    ) -> Result<()> {
        let record = self.load_algorithm(algorithm)?;
        let interface = record
            .interface(argument)
            .ok_or_else(|| DatapackageError::ArgumentNotDeclared {
                algorithm: algorithm.to_string(),
                argument: argument.to_string(),
            })?;

        let mut arguments = self.load_argument_space(algorithm, space)?;
        arguments.set_value(argument, value, interface)?;
        self.write_argument_space(algorithm, &arguments)?;

        info!(algorithm, space, argument, "argument updated");
        Ok(())
    }

    // =========================================================================
    // Algorithms and views
    // =========================================================================

    pub fn load_algorithm(&self, algorithm: &str) -> Result<AlgorithmRecord> {
        self.read_json(&self.algorithm_path(algorithm))
    }

    pub fn load_view(&self, view: &str) -> Result<ViewRecord> {
        self.read_json(&self.view_path(view))
    }

    /// Set `updated` in `datapackage.json` to the current Unix time, creating
    /// the file if it does not exist yet.
    pub fn touch(&self) -> Result<()> {
        let path = self.datapackage_path();
        let mut metadata: Map<String, Value> = if path.exists() {
            self.read_json(&path)?
        } else {
            Map::new()
        };
        metadata.insert(
            "updated".to_string(),
            Value::from(chrono::Utc::now().timestamp()),
        );
        self.write_json(&path, &metadata)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let raw = fs::read_to_string(path).map_err(|e| DatapackageError::io(path, e))?;
        serde_json::from_str(&raw).map_err(|e| DatapackageError::json(path, e))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DatapackageError::io(parent, e))?;
        }
        let mut raw = serde_json::to_string_pretty(value).map_err(|e| DatapackageError::json(path, e))?;
        raw.push('\n');
        fs::write(path, raw).map_err(|e| DatapackageError::io(path, e))
    }
}

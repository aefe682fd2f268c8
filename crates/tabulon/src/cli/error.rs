//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;
use tabulon::DatapackageError;
use tabulon_schema::{ArgumentError, ResourceError};

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    pub fn path_not_found(path: &Path) -> Self {
        Self::new(format!("Path not found: {}", path.display()))
            .with_context("The specified path does not exist on the filesystem")
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Pass the datapackage root with --base-path or TABULON_BASE_PATH".to_string(),
            ])
    }

    /// Attach suggestions to the datapackage failures users can act on.
    /// Anything else passes through unchanged.
    pub fn from_datapackage(err: DatapackageError) -> anyhow::Error {
        let helpful = match &err {
            DatapackageError::ResourceNotFound { resource, path } => Some(
                Self::new(format!("Resource '{}' not found", resource))
                    .with_context(format!("Expected {}", path.display()))
                    .with_suggestions([
                        "TRY: Check the datapackage root with: tabulon config".to_string(),
                        format!("TRY: ls {}", path.parent().unwrap_or(path.as_path()).display()),
                    ]),
            ),
            DatapackageError::ResourceNotPopulated { view, resource } => Some(
                Self::new(format!("View '{}' needs data in resource '{}'", view, resource))
                    .with_context("The resource has no rows yet")
                    .with_suggestion("TRY: Run the algorithm first: tabulon run <algorithm>"),
            ),
            DatapackageError::ArgumentNotDeclared { algorithm, argument } => Some(
                Self::new(format!("Algorithm '{}' has no argument '{}'", algorithm, argument))
                    .with_suggestion(format!("TRY: List arguments with: tabulon argument show {}", algorithm)),
            ),
            DatapackageError::Resource(ResourceError::SchemaDataMismatch {
                resource,
                schema_fields,
                data_columns,
            }) => Some(
                Self::new(format!("Data does not match the schema of '{}'", resource))
                    .with_context(format!(
                        "Schema fields: {:?}; data columns: {:?}",
                        schema_fields, data_columns
                    ))
                    .with_suggestions([
                        "TRY: Use the schema field names or titles as column labels",
                        "TRY: Keep the same number of columns as the existing schema",
                    ]),
            ),
            DatapackageError::Resource(ResourceError::MissingTemplate { resource }) => Some(
                Self::new(format!("Resource '{}' needs a template", resource))
                    .with_context("The resource has no schema yet, so one is generated from a template")
                    .with_suggestion("TRY: Pass --template <name> (see templates/)"),
            ),
            DatapackageError::Argument(ArgumentError::InvalidEnumValue { argument, allowed, .. }) => Some(
                Self::new(format!("Invalid value for '{}'", argument)).with_suggestion(format!(
                    "TRY: Use one of: {}",
                    allowed
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            ),
            DatapackageError::Io { path, .. } if !path.exists() => Some(Self::path_not_found(path)),
            _ => None,
        };

        match helpful {
            Some(helpful) => anyhow::Error::new(helpful.with_cause(&err)),
            None => err.into(),
        }
    }

    fn with_cause(self, err: &DatapackageError) -> Self {
        if self.context.is_some() {
            return self;
        }
        self.with_context(err.to_string())
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout, for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(|c| c.to_string()).collect::<Vec<_>>(),
        }),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{}", text),
        Err(_) => eprintln!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While reconciling data")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While reconciling data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_resource_not_populated_is_helpful() {
        let err = HelpfulError::from_datapackage(DatapackageError::ResourceNotPopulated {
            view: "plot".to_string(),
            resource: "fitted".to_string(),
        });

        let helpful = err.downcast_ref::<HelpfulError>().unwrap();
        assert!(helpful.message.contains("fitted"));
        assert!(helpful.suggestions.iter().any(|s| s.contains("tabulon run")));
    }

    #[test]
    fn test_missing_file_becomes_path_not_found() {
        let path = PathBuf::from("/nonexistent/templates/xy.json");
        let err = HelpfulError::from_datapackage(DatapackageError::Io {
            path: path.clone(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });

        let display = format!("{}", err);
        assert!(display.contains("/nonexistent/templates/xy.json"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = HelpfulError::from_datapackage(DatapackageError::NotAResourceArgument {
            argument: "method".to_string(),
            space: "default".to_string(),
        });
        assert!(err.downcast_ref::<HelpfulError>().is_none());
        assert!(err.downcast_ref::<DatapackageError>().is_some());
    }
}

//! # Declaration source.
//!
//! A [`ConfigSource`] yields the freshly declared descriptor set for one
//! reconciliation round. The supervisor reads it once eagerly at startup and
//! then on its reload cadence; a failed read abandons only that round.
//!
//! [`JsonFileSource`] is the built-in implementation: one JSON file holding
//! an array of descriptors. An empty array is a valid, empty fleet.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::descriptor::TaskDescriptor;
use crate::error::SourceError;

/// Source of declared task descriptor sets.
///
/// Implementations must reject duplicate names with a descriptive error and
/// must tolerate a location that yields zero descriptors.
#[async_trait]
pub trait ConfigSource: Send + Sync + 'static {
    /// Loads one complete declaration set, keyed by task name.
    async fn load(&self) -> Result<HashMap<String, TaskDescriptor>, SourceError>;
}

/// Declaration source backed by a single JSON file.
///
/// The file holds a JSON array of descriptors:
///
/// ```json
/// [
///   { "name": "router", "enabled": true, "interval_ms": 5000,
///     "endpoint": "http://127.0.0.1:9000/metrics" }
/// ]
/// ```
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source reading declarations from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigSource for JsonFileSource {
    async fn load(&self) -> Result<HashMap<String, TaskDescriptor>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        parse_declarations(&raw)
    }
}

/// Parses a JSON array of descriptors into a name-keyed set.
///
/// Two descriptors with the same name are a configuration error, not a
/// runtime merge; the whole set is rejected.
pub(crate) fn parse_declarations(
    raw: &str,
) -> Result<HashMap<String, TaskDescriptor>, SourceError> {
    let declared: Vec<TaskDescriptor> = serde_json::from_str(raw)?;

    let mut set = HashMap::with_capacity(declared.len());
    for descriptor in declared {
        let name = descriptor.name.clone();
        if set.insert(name.clone(), descriptor).is_some() {
            return Err(SourceError::DuplicateName { name });
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_declaration_set() {
        let set = parse_declarations(
            r#"[
                { "name": "a", "enabled": true,  "interval_ms": 5000, "endpoint": "http://h/a" },
                { "name": "b", "enabled": false, "interval_ms": 250,  "endpoint": "http://h/b" }
            ]"#,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert!(set["a"].enabled);
        assert_eq!(set["b"].interval_ms, 250);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = parse_declarations(
            r#"[
                { "name": "a", "enabled": true, "interval_ms": 1000, "endpoint": "http://h/1" },
                { "name": "a", "enabled": true, "interval_ms": 2000, "endpoint": "http://h/2" }
            ]"#,
        )
        .unwrap_err();

        assert!(matches!(err, SourceError::DuplicateName { name } if name == "a"));
    }

    #[test]
    fn test_empty_set_is_valid() {
        let set = parse_declarations("[]").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_malformed_document_rejected() {
        assert!(matches!(
            parse_declarations("{ not json").unwrap_err(),
            SourceError::Parse(_)
        ));
    }
}

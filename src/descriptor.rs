//! # Declared task parameters.
//!
//! A [`TaskDescriptor`] is the externally declared description of one polling
//! task: a unique name, an enabled flag, a poll interval, and the endpoint to
//! fetch. One descriptor set is the input to one reconciliation round; the
//! runtime never mutates a descriptor, it replaces the whole thing.
//!
//! ## Example
//! ```rust
//! use pollvisor::TaskDescriptor;
//!
//! let desc: TaskDescriptor = serde_json::from_str(
//!     r#"{ "name": "router", "enabled": true, "interval_ms": 5000,
//!          "endpoint": "http://127.0.0.1:9000/metrics" }"#,
//! ).unwrap();
//!
//! assert!(desc.validate().is_ok());
//! assert_eq!(desc.interval().as_secs(), 5);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::DescriptorError;

/// Declared parameters for one polling task.
///
/// Descriptors are immutable per version: a change in any field arrives as a
/// fresh descriptor through reconciliation, never as an in-place edit.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Unique task name; the fleet key.
    pub name: String,
    /// Whether the task actually fetches. A disabled task keeps its schedule.
    pub enabled: bool,
    /// Poll interval in milliseconds; must be positive.
    pub interval_ms: u64,
    /// URL fetched on each enabled tick.
    pub endpoint: String,
}

impl TaskDescriptor {
    /// Returns the poll interval as a [`Duration`].
    #[inline]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Checks that the descriptor can drive a worker.
    ///
    /// A failed validation affects only this task; other descriptors in the
    /// same declaration set are unaffected.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if self.endpoint.is_empty() {
            return Err(DescriptorError::EmptyEndpoint {
                name: self.name.clone(),
            });
        }
        if self.interval_ms == 0 {
            return Err(DescriptorError::ZeroInterval {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, interval_ms: u64, endpoint: &str) -> TaskDescriptor {
        TaskDescriptor {
            name: name.to_string(),
            enabled: true,
            interval_ms,
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn test_valid_descriptor_passes() {
        assert!(descriptor("a", 500, "http://localhost:1").validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = descriptor("a", 0, "http://localhost:1").validate().unwrap_err();
        assert!(matches!(err, DescriptorError::ZeroInterval { .. }));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let err = descriptor("a", 500, "").validate().unwrap_err();
        assert!(matches!(err, DescriptorError::EmptyEndpoint { .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = descriptor("", 500, "http://localhost:1").validate().unwrap_err();
        assert!(matches!(err, DescriptorError::EmptyName));
    }
}

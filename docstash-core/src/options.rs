//! Tuning options for document containers.

use serde::{Deserialize, Serialize};

use crate::error::{ContainerError, ContainerResult};

/// Options applied when a container is built.
///
/// Deserializable so a catalog can keep per-container settings next to its
/// own configuration.
///
/// ```ignore
/// let options: ContainerOptions = serde_json::from_str(r#"{ "shard_amount": 16 }"#)?;
/// let container = DocumentContainer::builder("users", tracker)
///     .with_options(options)
///     .build()?;
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ContainerOptions {
    /// Minimum number of documents to pre-size the map for.
    ///
    /// The map is always pre-sized to at least the initial snapshot length.
    pub initial_capacity: Option<usize>,
    /// Number of independently locked shards. Must be a power of two greater than one.
    pub shard_amount: Option<usize>,
}

impl ContainerOptions {
    /// Checks the options for values the map cannot honor.
    pub fn validate(&self) -> ContainerResult<()> {
        if let Some(shards) = self.shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(ContainerError::Configuration(format!(
                    "shard_amount must be a power of two greater than one, got {shards}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        assert!(ContainerOptions::default().validate().is_ok());
    }

    #[test]
    fn shard_amount_must_be_power_of_two() {
        for bad in [0, 1, 3, 12] {
            let options = ContainerOptions { shard_amount: Some(bad), ..Default::default() };
            assert!(matches!(options.validate(), Err(ContainerError::Configuration(_))));
        }

        let options = ContainerOptions { shard_amount: Some(32), ..Default::default() };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn missing_fields_deserialize_to_none() {
        let options: ContainerOptions = serde_json::from_str(r#"{ "initial_capacity": 64 }"#).unwrap();

        assert_eq!(options.initial_capacity, Some(64));
        assert_eq!(options.shard_amount, None);
    }
}

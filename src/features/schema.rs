//! Model feature schema and positional alignment.
//!
//! Trained models are position-sensitive: column `i` of the input must be the
//! feature the model saw in column `i` during training. `FeatureSchema::align`
//! is the only place a named feature map becomes a positional vector.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Named feature values produced by the deriver.
pub type FeatureMap = BTreeMap<String, f64>;

/// Ordered list of feature names declared alongside a trained model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, AppError> {
        if names.is_empty() {
            return Err(AppError::new(2, "Model feature schema is empty."));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(AppError::new(2, "Model feature schema contains a blank name."));
            }
            if !seen.insert(name.as_str()) {
                return Err(AppError::new(
                    2,
                    format!("Duplicate feature '{name}' in model schema."),
                ));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Order `features` by the schema, filling absent names with 0 and
    /// dropping names the schema does not declare.
    pub fn align(&self, features: &FeatureMap) -> Vec<f64> {
        self.names
            .iter()
            .map(|name| features.get(name).copied().unwrap_or(0.0))
            .collect()
    }

    /// Declared names the map does not provide (diagnostics only).
    pub fn missing<'a>(&'a self, features: &FeatureMap) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|name| !features.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = AppError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(value: FeatureSchema) -> Self {
        value.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn align_fills_missing_drops_extra_and_reorders() {
        let s = schema(&["lag_2", "lag_1", "unknown"]);
        let mut map = FeatureMap::new();
        map.insert("lag_1".to_string(), 1.5);
        map.insert("lag_2".to_string(), 2.5);
        map.insert("extra".to_string(), 9.0);

        assert_eq!(s.align(&map), vec![2.5, 1.5, 0.0]);
        assert_eq!(s.missing(&map), vec!["unknown"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = FeatureSchema::new(vec!["a".into(), "b".into(), "a".into()]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(FeatureSchema::new(Vec::new()).is_err());
    }

    #[test]
    fn schema_deserializes_from_plain_list() {
        let s: FeatureSchema = serde_json::from_str(r#"["lag_1","Rolling3"]"#).unwrap();
        assert_eq!(s.len(), 2);
        assert!(serde_json::from_str::<FeatureSchema>(r#"["x","x"]"#).is_err());
    }
}

use std::collections::HashMap;

use super::FilterError;

/// Maps filter queryable names onto request parameter names.
///
/// Resolved names are memoized, so a name seen once keeps resolving to the
/// same parameter for the rest of the translation.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    explicit: HashMap<String, String>,
    passthrough: bool,
    resolved: HashMap<String, String>,
}

impl AttributeMap {
    /// Identity mapping: every name resolves to itself.
    pub fn identity() -> Self {
        Self {
            passthrough: true,
            ..Self::default()
        }
    }

    /// Explicit mapping; names outside it resolve to themselves only with `passthrough`.
    pub fn new(explicit: HashMap<String, String>, passthrough: bool) -> Self {
        Self {
            explicit,
            passthrough,
            resolved: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, name: &str) -> Result<String, FilterError> {
        if let Some(physical) = self.resolved.get(name) {
            return Ok(physical.clone());
        }

        let physical = match self.explicit.get(name) {
            Some(physical) => physical.clone(),
            None if self.passthrough => name.to_string(),
            None => return Err(FilterError::UnknownAttribute(name.to_string())),
        };

        self.resolved.insert(name.to_string(), physical.clone());
        Ok(physical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let mut map = AttributeMap::identity();
        assert_eq!(map.resolve("site").unwrap(), "site");
    }

    #[test]
    fn test_explicit_with_passthrough() {
        let mut map = AttributeMap::new(
            HashMap::from([("station".to_string(), "site".to_string())]),
            true,
        );
        assert_eq!(map.resolve("station").unwrap(), "site");
        assert_eq!(map.resolve("data_type").unwrap(), "data_type");
    }

    #[test]
    fn test_strict_mapping_rejects_unknown() {
        let mut map = AttributeMap::new(HashMap::new(), false);
        let err = map.resolve("site").unwrap_err();
        assert!(matches!(err, FilterError::UnknownAttribute(name) if name == "site"));
    }

    #[test]
    fn test_resolution_is_memoized() {
        let mut map = AttributeMap::new(
            HashMap::from([("station".to_string(), "site".to_string())]),
            false,
        );
        assert_eq!(map.resolve("station").unwrap(), "site");
        map.explicit.clear();
        assert_eq!(map.resolve("station").unwrap(), "site");
    }
}

//! Weight table: relative importance of each test

use std::collections::BTreeMap;

/// Weight used for names with no configured entry
pub const DEFAULT_WEIGHT: u32 = 1;

/// Maps test names to weights, with a fallback for unlisted names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightTable {
    weights: BTreeMap<String, u32>,
    default: u32,
}

impl WeightTable {
    /// Empty table; every name weighs [`DEFAULT_WEIGHT`]
    pub fn new() -> Self {
        Self {
            weights: BTreeMap::new(),
            default: DEFAULT_WEIGHT,
        }
    }

    /// Override the fallback weight. Zero is raised to 1.
    pub fn with_default(mut self, default: u32) -> Self {
        self.default = default.max(1);
        self
    }

    /// Set the weight for one name. Zero is raised to 1.
    pub fn set(&mut self, name: impl Into<String>, weight: u32) {
        self.weights.insert(name.into(), weight.max(1));
    }

    /// Builder form of [`WeightTable::set`]
    pub fn with(mut self, name: impl Into<String>, weight: u32) -> Self {
        self.set(name, weight);
        self
    }

    /// Configured weight for `name`, or the default
    pub fn weight_of(&self, name: &str) -> u32 {
        self.weights.get(name).copied().unwrap_or(self.default)
    }

    pub fn default_weight(&self) -> u32 {
        self.default
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut table = WeightTable::new();
        for (name, weight) in iter {
            table.set(name, weight);
        }
        table
    }
}

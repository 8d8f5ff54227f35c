//! Test registry - ordered, named test cases

use crate::error::{HarnessError, HarnessResult, TestError};
use crate::runner::TestContext;
use crate::weights::WeightTable;
use std::fmt;

/// Body of a test case
pub type TestBody = Box<dyn FnMut(&mut TestContext<'_>) -> Result<(), TestError>>;

/// A named check with a weight and a critical flag
pub struct TestCase {
    name: String,
    /// Explicit weight; `None` defers to the weight table
    weight: Option<u32>,
    critical: bool,
    body: TestBody,
}

impl TestCase {
    /// Non-critical case whose weight comes from the weight table
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnMut(&mut TestContext<'_>) -> Result<(), TestError> + 'static,
    {
        Self {
            name: name.into(),
            weight: None,
            critical: false,
            body: Box::new(body),
        }
    }

    /// Pin the weight, ignoring the weight table
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Mark as critical: a failure stops the run
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Option<u32> {
        self.weight
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Explicit weight if pinned, otherwise the table's entry
    pub fn resolved_weight(&self, table: &WeightTable) -> u32 {
        self.weight.unwrap_or_else(|| table.weight_of(&self.name))
    }

    pub(crate) fn call(&mut self, ctx: &mut TestContext<'_>) -> Result<(), TestError> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}

/// Test cases in registration order
#[derive(Debug, Default)]
pub struct Registry {
    cases: Vec<TestCase>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a case. Registering an existing name replaces that entry in
    /// its original position.
    pub fn register(&mut self, case: TestCase) -> HarnessResult<()> {
        if case.weight == Some(0) {
            return Err(HarnessError::InvalidWeight { name: case.name });
        }
        match self.cases.iter_mut().find(|c| c.name == case.name) {
            Some(slot) => *slot = case,
            None => self.cases.push(case),
        }
        Ok(())
    }

    /// Keep only cases whose name contains `pattern`
    pub fn filter(&mut self, pattern: &str) {
        self.cases.retain(|c| c.name.contains(pattern));
    }

    pub fn get(&self, name: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TestCase> {
        self.cases.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass() -> TestCase {
        TestCase::new("pass", |_| Ok(()))
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = Registry::new();
        for name in ["b", "a", "c"] {
            registry.register(TestCase::new(name, |_| Ok(()))).unwrap();
        }
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_name_replaces_in_place() {
        let mut registry = Registry::new();
        registry.register(TestCase::new("x", |_| Ok(()))).unwrap();
        registry.register(TestCase::new("y", |_| Ok(()))).unwrap();
        registry
            .register(TestCase::new("x", |_| Ok(())).with_weight(9).critical())
            .unwrap();

        assert_eq!(registry.names(), vec!["x", "y"]);
        let x = registry.get("x").unwrap();
        assert_eq!(x.weight(), Some(9));
        assert!(x.is_critical());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let mut registry = Registry::new();
        let err = registry.register(pass().with_weight(0)).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidWeight { ref name } if name == "pass"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolved_weight() {
        let table = WeightTable::new().with("pass", 7);
        assert_eq!(pass().resolved_weight(&table), 7);
        assert_eq!(pass().with_weight(2).resolved_weight(&table), 2);
        assert_eq!(pass().resolved_weight(&WeightTable::new()), 1);
    }

    #[test]
    fn test_filter() {
        let mut registry = Registry::new();
        for name in ["create_part", "create_frame", "bench_set"] {
            registry.register(TestCase::new(name, |_| Ok(()))).unwrap();
        }
        registry.filter("create");
        assert_eq!(registry.names(), vec!["create_part", "create_frame"]);
    }

    #[test]
    fn test_debug_omits_body() {
        let text = format!("{:?}", pass().critical());
        assert!(text.contains("\"pass\""));
        assert!(text.contains("critical: true"));
    }
}

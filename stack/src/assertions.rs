//! Structural checks over a synthesized template.
//!
//! Matching is subset based: an expected object matches when every one of
//! its keys matches the actual value, an expected array matches when each
//! of its elements matches some element of the actual array, and scalars
//! match by equality. This mirrors how the deployment template is asserted
//! on in tests: pin down the fragment that matters, ignore the rest.

use crate::template::Template;
use serde_json::Value;
use std::collections::BTreeMap;

impl Template {
    /// All resources of the given CloudFormation type, keyed by logical id
    pub fn find_resources(&self, resource_type: &str) -> BTreeMap<String, &Value> {
        self.resources()
            .iter()
            .filter(|(_, resource)| {
                resource.get("Type").and_then(|t| t.as_str()) == Some(resource_type)
            })
            .map(|(name, resource)| (name.clone(), resource))
            .collect()
    }

    /// Assert that a resource of the given type declares the properties
    ///
    /// Succeeds when at least one resource of the type matches the expected
    /// fragment. On failure the error carries the fragment and the actual
    /// candidates, so a mismatch reads as a diff.
    pub fn has_resource_properties(
        &self,
        resource_type: &str,
        expected: &Value,
    ) -> eyre::Result<()> {
        let candidates = self.find_resources(resource_type);

        let is_found = candidates.values().any(|resource| {
            resource
                .get("Properties")
                .is_some_and(|properties| is_match(expected, properties))
        });

        if is_found {
            return Ok(());
        }

        let actual = candidates
            .iter()
            .map(|(name, resource)| format!("{name}: {:#}", resource["Properties"]))
            .collect::<Vec<String>>()
            .join("\n");

        eyre::bail!(
            "No {resource_type} resource matches\nExpected:\n{expected:#}\nActual:\n{}",
            if actual.is_empty() {
                "(no resources of this type)".to_string()
            } else {
                actual
            }
        )
    }

    /// Assert the exact number of resources of the given type
    pub fn resource_count_is(&self, resource_type: &str, count: usize) -> eyre::Result<()> {
        let found = self.find_resources(resource_type).len();

        if found != count {
            eyre::bail!("Expected {count} {resource_type} resources, found {found}");
        }

        Ok(())
    }
}

/// Subset comparison of an expected fragment against an actual value
pub fn is_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|a| is_match(value, a))),

        (Value::Array(expected), Value::Array(actual)) => expected
            .iter()
            .all(|value| actual.iter().any(|a| is_match(value, a))),

        (expected, actual) => expected == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{Env, UserManagerStack};
    use serde_json::json;

    fn template() -> Template {
        let stack =
            UserManagerStack::new("user-manager", Env::new("111111111111", "eu-central-1"));
        Template::from_stack(&stack).unwrap()
    }

    #[test]
    fn objects_match_on_subsets() {
        let actual = json!({"a": 1, "b": {"c": 2, "d": 3}});

        assert!(is_match(&json!({"b": {"c": 2}}), &actual));
        assert!(!is_match(&json!({"b": {"c": 4}}), &actual));
        assert!(!is_match(&json!({"e": 1}), &actual));
    }

    #[test]
    fn arrays_match_when_each_expected_element_is_present() {
        let actual = json!([{"name": "a"}, {"name": "b"}]);

        assert!(is_match(&json!([{"name": "b"}]), &actual));
        assert!(!is_match(&json!([{"name": "c"}]), &actual));
    }

    #[test]
    fn scalars_match_by_equality() {
        assert!(is_match(&json!("ANY"), &json!("ANY")));
        assert!(!is_match(&json!(1), &json!("1")));
    }

    #[test]
    fn missing_fragment_reports_expected_and_actual() {
        let error = template()
            .has_resource_properties("AWS::Lambda::Function", &json!({"Handler": "missing"}))
            .unwrap_err();

        let message = error.to_string();
        assert!(message.contains("Expected"));
        assert!(message.contains("missing"));
        assert!(message.contains("bootstrap"));
    }

    #[test]
    fn counts_resources_by_type() {
        let template = template();

        template
            .resource_count_is("AWS::Lambda::Function", 1)
            .unwrap();

        // The ANY route plus two CORS preflights
        template
            .resource_count_is("AWS::ApiGateway::Method", 3)
            .unwrap();
    }
}

//! Deployment-property templates
//!
//! A template is a flat object whose values are either literals or a
//! reference to a stack output:
//!
//! ```yaml
//! serviceURL:
//!   endpoint: { "@DeploymentProp": ServiceEndpoint }
//!   kind: rest
//! ```
//!
//! Only top-level values are inspected. Nested structures are literals and
//! keep the key order they were written in.

use crate::model::NormalizedOutputMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key marking a value as a reference to a stack output
pub const DEPLOYMENT_PROP_MARKER: &str = "@DeploymentProp";

/// A single template value, classified when the config is loaded
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// Copied to the result unchanged
    Literal(serde_json::Value),
    /// Replaced by the named stack output
    Reference(String),
}

impl TemplateValue {
    /// Classify a raw config value
    ///
    /// `{"@DeploymentProp": "<key>"}` with exactly one entry and a string key
    /// is a reference. Anything else is a literal.
    pub fn classify(value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &value
            && map.len() == 1
            && let Some(serde_json::Value::String(key)) = map.get(DEPLOYMENT_PROP_MARKER)
        {
            return TemplateValue::Reference(key.clone());
        }
        TemplateValue::Literal(value)
    }
}

/// Ordered property name → value template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentPropertyTemplate {
    properties: Vec<(String, TemplateValue)>,
}

impl DeploymentPropertyTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property, replacing an earlier one with the same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: TemplateValue) {
        let name = name.into();
        if let Some(slot) = self.properties.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.properties.push((name, value));
        }
    }

    pub fn with_literal(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.insert(name, TemplateValue::Literal(value));
        self
    }

    pub fn with_reference(mut self, name: impl Into<String>, output_key: impl Into<String>) -> Self {
        self.insert(name, TemplateValue::Reference(output_key.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<'de> Deserialize<'de> for DeploymentPropertyTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemplateVisitor;

        impl<'de> Visitor<'de> for TemplateVisitor {
            type Value = DeploymentPropertyTemplate;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of property names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut template = DeploymentPropertyTemplate::new();
                while let Some((name, value)) =
                    access.next_entry::<String, serde_json::Value>()?
                {
                    template.insert(name, TemplateValue::classify(value));
                }
                Ok(template)
            }
        }

        deserializer.deserialize_map(TemplateVisitor)
    }
}

/// Result of resolving a template against stack outputs
///
/// A property whose reference points at a missing output is kept with an
/// unset (`None`) value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProperties {
    properties: Vec<(String, Option<serde_json::Value>)>,
}

impl ResolvedProperties {
    /// Value of a property; `None` when missing or unset
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether the property exists, set or not
    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&serde_json::Value>)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Render as a JSON object in template order, omitting unset properties
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for ResolvedProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let set: Vec<_> = self
            .properties
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n, v)))
            .collect();

        let mut map = serializer.serialize_map(Some(set.len()))?;
        for (name, value) in set {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Resolve `@DeploymentProp` references against stack outputs
///
/// No template yields `None`, which callers must keep distinct from an empty
/// template.
pub fn resolve(
    template: Option<&DeploymentPropertyTemplate>,
    outputs: &NormalizedOutputMap,
) -> Option<ResolvedProperties> {
    let template = template?;

    let properties = template
        .iter()
        .map(|(name, value)| {
            let resolved = match value {
                TemplateValue::Reference(key) => {
                    let found = outputs
                        .get(key)
                        .map(|v| serde_json::Value::String(v.to_string()));
                    tracing::debug!(
                        property = name,
                        output_key = %key,
                        found = found.is_some(),
                        "Resolved deployment property"
                    );
                    found
                }
                TemplateValue::Literal(literal) => {
                    tracing::debug!(property = name, "Copied literal property");
                    Some(literal.clone())
                }
            };
            (name.to_string(), resolved)
        })
        .collect();

    Some(ResolvedProperties { properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outputs() -> NormalizedOutputMap {
        [
            ("ServiceEndpoint", "https:someurl.com/1234"),
            (
                "SomeLambdaFunctionArnLambdaFunctionQualifiedArn",
                "service-1234-serverlessdeploymentbuck-1vjy5rcxdcfce",
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_absent_template_stays_absent() {
        assert_eq!(resolve(None, &outputs()), None);
    }

    #[test]
    fn test_empty_template_is_not_absent() {
        let template = DeploymentPropertyTemplate::new();
        let resolved = resolve(Some(&template), &outputs()).unwrap();
        assert!(resolved.is_empty());
        assert_eq!(resolved.to_json_string().unwrap(), "{}");
    }

    #[test]
    fn test_literal_and_reference() {
        let template = DeploymentPropertyTemplate::new()
            .with_literal("a", json!("literal"))
            .with_reference("b", "X");
        let outputs: NormalizedOutputMap = [("X", "resolved")].into_iter().collect();

        let resolved = resolve(Some(&template), &outputs).unwrap();
        assert_eq!(resolved.get("a"), Some(&json!("literal")));
        assert_eq!(resolved.get("b"), Some(&json!("resolved")));
        assert_eq!(
            resolved.to_json_string().unwrap(),
            r#"{"a":"literal","b":"resolved"}"#
        );
    }

    #[test]
    fn test_missing_reference_is_present_but_unset() {
        let template = DeploymentPropertyTemplate::new()
            .with_reference("endpoint", "DoesNotExist")
            .with_literal("kind", json!("rest"));

        let resolved = resolve(Some(&template), &outputs()).unwrap();
        assert!(resolved.contains("endpoint"));
        assert_eq!(resolved.get("endpoint"), None);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.to_json_string().unwrap(), r#"{"kind":"rest"}"#);
    }

    #[test]
    fn test_parse_template_from_yaml() {
        let yaml = r#"
nonPropValue: unchanged value
servicePath: { "@DeploymentProp": ServiceEndpoint }
someLambdaFunctionArn:
  "@DeploymentProp": SomeLambdaFunctionArnLambdaFunctionQualifiedArn
"#;
        let template: DeploymentPropertyTemplate = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = template.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["nonPropValue", "servicePath", "someLambdaFunctionArn"]);

        let resolved = resolve(Some(&template), &outputs()).unwrap();
        assert_eq!(resolved.get("servicePath"), Some(&json!("https:someurl.com/1234")));
        assert_eq!(
            resolved.get("someLambdaFunctionArn"),
            Some(&json!("service-1234-serverlessdeploymentbuck-1vjy5rcxdcfce"))
        );
        assert_eq!(resolved.get("nonPropValue"), Some(&json!("unchanged value")));
    }

    #[test]
    fn test_nested_values_are_literals() {
        assert_eq!(
            TemplateValue::classify(json!({"@DeploymentProp": "A", "extra": 1})),
            TemplateValue::Literal(json!({"@DeploymentProp": "A", "extra": 1}))
        );
        assert_eq!(
            TemplateValue::classify(json!({"@DeploymentProp": 42})),
            TemplateValue::Literal(json!({"@DeploymentProp": 42}))
        );
        assert_eq!(
            TemplateValue::classify(json!({"inner": {"@DeploymentProp": "A"}})),
            TemplateValue::Literal(json!({"inner": {"@DeploymentProp": "A"}}))
        );
    }

    #[test]
    fn test_nested_literal_keeps_key_order() {
        let yaml = r#"
meta:
  zeta: 1
  alpha: 2
  mid: { second: b, first: a }
endpoint: { "@DeploymentProp": ServiceEndpoint }
"#;
        let template: DeploymentPropertyTemplate = serde_yaml::from_str(yaml).unwrap();
        let resolved = resolve(Some(&template), &outputs()).unwrap();

        assert_eq!(
            resolved.to_json_string().unwrap(),
            r#"{"meta":{"zeta":1,"alpha":2,"mid":{"second":"b","first":"a"}},"endpoint":"https:someurl.com/1234"}"#
        );
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static metadata for a model, reported alongside its measurements.
///
/// None of these fields are queried from the inference server; they come from
/// configuration and are copied verbatim into every result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub size: String,
    pub context: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub parameters: String,
}

impl ModelDescriptor {
    pub fn new(size: &str, context: &str, kind: &str, parameters: &str) -> Self {
        Self {
            size: size.to_string(),
            context: context.to_string(),
            kind: kind.to_string(),
            parameters: parameters.to_string(),
        }
    }
}

/// Lookup table from model identifier (`name:tag`) to its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    descriptors: HashMap<String, ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    pub fn with(mut self, model: &str, descriptor: ModelDescriptor) -> Self {
        self.descriptors.insert(model.to_string(), descriptor);
        self
    }

    /// Returns `None` for models missing from the table.
    pub fn get(&self, model: &str) -> Option<&ModelDescriptor> {
        self.descriptors.get(model)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.descriptors.contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for ModelCatalog {
    /// The built-in table for the default model list.
    fn default() -> Self {
        Self::new()
            .with("mistral:7b", ModelDescriptor::new("7B", "8192", "Base", "7B"))
            .with("qwen2:latest", ModelDescriptor::new("7B", "32768", "Base", "7B"))
            .with("llama3.1:latest", ModelDescriptor::new("8B", "8192", "Base", "8B"))
            .with("deepseek-r1:7b", ModelDescriptor::new("7B", "16384", "Base", "7B"))
            .with("llama2:latest", ModelDescriptor::new("7B", "4096", "Base", "7B"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_lookup() {
        let catalog = ModelCatalog::default();
        assert_eq!(catalog.len(), 5);

        let qwen = catalog.get("qwen2:latest").unwrap();
        assert_eq!(qwen.context, "32768");
        assert_eq!(qwen.kind, "Base");

        // Unknown identifiers are a plain miss, not a panic
        assert!(catalog.get("phi3:mini").is_none());
        assert!(!catalog.contains("mistral"));
    }

    #[test]
    fn test_descriptor_type_field_name() {
        let descriptor: ModelDescriptor = toml::from_str(
            r#"
            size = "3B"
            context = "4096"
            type = "Instruct"
            parameters = "3.2B"
            "#,
        )
        .unwrap();
        assert_eq!(descriptor, ModelDescriptor::new("3B", "4096", "Instruct", "3.2B"));
    }
}

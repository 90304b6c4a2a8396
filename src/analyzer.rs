//! Static-analysis collaborator client.
//!
//! A remote service inspects submitted code and reports declared data
//! structures plus a complexity estimate. The engine consumes only enough
//! of that to pick an initial visualizer type; the classifier is best
//! effort and any failure falls back to the array visualizer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::VisualizerType;

#[derive(Debug, Clone, Serialize)]
pub struct ParseRequest {
    pub code: String,
    pub language: String,
}

/// Subset of the analysis response the engine cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseResult {
    #[serde(default)]
    pub visualizer_type: Option<String>,
    #[serde(default)]
    pub data_structures: Vec<String>,
    #[serde(default)]
    pub complexity: Option<ComplexityResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplexityResult {
    #[serde(default)]
    pub time_complexity: String,
    #[serde(default)]
    pub space_complexity: String,
}

#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    async fn analyze(&self, code: &str, language: &str) -> anyhow::Result<ParseResult>;
}

/// HTTP client for the analysis service.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalyzer {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CodeAnalyzer for HttpAnalyzer {
    async fn analyze(&self, code: &str, language: &str) -> anyhow::Result<ParseResult> {
        let request = ParseRequest {
            code: code.to_string(),
            language: language.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/parse", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

/// Analyzer used when no analysis service is deployed; every session gets
/// the default visualizer.
pub struct NoopAnalyzer;

#[async_trait]
impl CodeAnalyzer for NoopAnalyzer {
    async fn analyze(&self, _code: &str, _language: &str) -> anyhow::Result<ParseResult> {
        Ok(ParseResult::default())
    }
}

/// Map an analysis result onto a visualizer type. Unrecognized or absent
/// classifications default to the array visualizer.
pub fn visualizer_type_for(result: &ParseResult) -> VisualizerType {
    if let Some(declared) = result.visualizer_type.as_deref() {
        if let Some(mapped) = map_structure(declared) {
            return mapped;
        }
    }

    result
        .data_structures
        .iter()
        .find_map(|s| map_structure(s))
        .unwrap_or_default()
}

fn map_structure(name: &str) -> Option<VisualizerType> {
    match name {
        "tree" => Some(VisualizerType::Tree),
        "graph" => Some(VisualizerType::Graph),
        "linked_list" | "linkedList" => Some(VisualizerType::LinkedList),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_array() {
        assert_eq!(
            visualizer_type_for(&ParseResult::default()),
            VisualizerType::Array
        );
    }

    #[test]
    fn test_declared_visualizer_type_wins() {
        let result = ParseResult {
            visualizer_type: Some("tree".to_string()),
            data_structures: vec!["graph".to_string()],
            complexity: None,
        };
        assert_eq!(visualizer_type_for(&result), VisualizerType::Tree);
    }

    #[test]
    fn test_data_structures_fallback() {
        let result = ParseResult {
            visualizer_type: None,
            data_structures: vec!["hash".to_string(), "linked_list".to_string()],
            complexity: None,
        };
        assert_eq!(visualizer_type_for(&result), VisualizerType::LinkedList);
    }

    #[test]
    fn test_unknown_structures_default_to_array() {
        let result = ParseResult {
            visualizer_type: Some("matrix".to_string()),
            data_structures: vec!["stack".to_string()],
            complexity: None,
        };
        assert_eq!(visualizer_type_for(&result), VisualizerType::Array);
    }

    #[tokio::test]
    async fn test_noop_analyzer_is_empty() {
        let result = NoopAnalyzer.analyze("x = 1", "python").await.unwrap();
        assert!(result.visualizer_type.is_none());
        assert!(result.data_structures.is_empty());
    }
}

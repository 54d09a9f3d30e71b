use serde_json::{Map, Value};
use thiserror::Error;

use crate::completion::{CompletionClient, CompletionError};
use crate::minutes::MinutesDocument;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("malformed extraction: {0}")]
    MalformedExtraction(String),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// The JSON entity tree recovered from one completion, before
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGraph {
    root: Map<String, Value>,
}

impl CandidateGraph {
    /// Recovers the JSON object embedded in free-form completion text.
    ///
    /// Completions routinely wrap the payload in code fences or prose, so
    /// everything outside the first `{` and the last `}` is discarded
    /// before decoding.
    pub fn from_completion(text: &str) -> ExtractResult<Self> {
        let start = text.find('{').ok_or_else(|| {
            ExtractError::MalformedExtraction("no JSON object in completion".to_owned())
        })?;
        let end = text.rfind('}').filter(|end| *end >= start).ok_or_else(|| {
            ExtractError::MalformedExtraction("unterminated JSON object in completion".to_owned())
        })?;
        match serde_json::from_str(&text[start..=end]) {
            Ok(Value::Object(root)) => Ok(Self { root }),
            Ok(_) => Err(ExtractError::MalformedExtraction(
                "completion payload is not a JSON object".to_owned(),
            )),
            Err(error) => Err(ExtractError::MalformedExtraction(error.to_string())),
        }
    }

    #[must_use]
    pub fn from_root(root: Map<String, Value>) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn into_root(self) -> Map<String, Value> {
        self.root
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }
}

/// Turns minutes text into a candidate graph through one completion call.
pub struct GraphExtractor {
    client: Box<dyn CompletionClient>,
    prompt_template: String,
}

impl GraphExtractor {
    pub fn new(client: Box<dyn CompletionClient>, prompt_template: impl Into<String>) -> Self {
        Self { client, prompt_template: prompt_template.into() }
    }

    /// One extraction attempt. No retry here: failures surface so the
    /// review loop can decide what happens next.
    pub async fn extract(&self, document: &MinutesDocument) -> ExtractResult<CandidateGraph> {
        tracing::info!(document = %document.id, "requesting graph extraction");
        let prompt = format!("{}{}", self.prompt_template, document.text);
        let completion = self.client.complete(&prompt).await?;
        let graph = CandidateGraph::from_completion(&completion)?;
        tracing::debug!(document = %document.id, fields = graph.root.len(), "decoded candidate graph");
        Ok(graph)
    }
}

impl std::fmt::Debug for GraphExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphExtractor")
            .field("prompt_template_len", &self.prompt_template.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::completion::CompletionResult;

    use super::*;

    struct ScriptedClient {
        response: String,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedClient {
        fn new(response: &str) -> Self {
            Self { response: response.to_owned(), prompts: Arc::default() }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> CompletionResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_owned());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn recovers_json_from_fenced_completions() {
        let graph = CandidateGraph::from_completion(
            "```json\n{\"@type\": \"Event\", \"name\": \"Board Meeting\"}\n```",
        )
        .unwrap();
        assert_eq!(graph.get("name"), Some(&Value::String("Board Meeting".to_owned())));
    }

    #[test]
    fn recovers_json_surrounded_by_prose() {
        let graph = CandidateGraph::from_completion(
            "Here is the graph you asked for: {\"name\": \"Board Meeting\"} Let me know!",
        )
        .unwrap();
        assert_eq!(graph.get("name"), Some(&Value::String("Board Meeting".to_owned())));
    }

    #[test]
    fn missing_braces_are_malformed() {
        let error = CandidateGraph::from_completion("no json here").unwrap_err();
        assert!(matches!(error, ExtractError::MalformedExtraction(_)));
    }

    #[test]
    fn inverted_braces_are_malformed() {
        let error = CandidateGraph::from_completion("} backwards {").unwrap_err();
        assert!(matches!(error, ExtractError::MalformedExtraction(_)));
    }

    #[test]
    fn undecodable_payloads_are_malformed() {
        let error = CandidateGraph::from_completion("{\"name\": }").unwrap_err();
        assert!(matches!(error, ExtractError::MalformedExtraction(_)));
    }

    #[tokio::test]
    async fn prompt_is_template_followed_by_document_text() {
        let client = ScriptedClient::new("{\"name\": \"Board Meeting\"}");
        let prompts = Arc::clone(&client.prompts);
        let document = MinutesDocument::new("m1", "Motion passed 5-0").unwrap();

        let extractor = GraphExtractor::new(Box::new(client), "Extract a graph from:\n\n");
        extractor.extract(&document).await.unwrap();

        let recorded = prompts.lock().unwrap();
        assert_eq!(recorded.as_slice(), ["Extract a graph from:\n\nMotion passed 5-0"]);
    }
}

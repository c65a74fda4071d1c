use crate::agent::StepError;
use crate::config::SearchConfig;
use crate::llm::ToolSpec;
use crate::tools::http_post_json;
use serde_json::{Value, json};

/// Name the search tool is declared under when bound to a chat model.
pub const SEARCH_TOOL_NAME: &str = "tavily_search_results_json";

/// A blocking web-search backend.
pub trait SearchTool: Send + Sync {
    fn search(&self, query: &str) -> Result<Value, StepError>;

    /// The declaration handed to the chat model.
    fn spec(&self) -> ToolSpec {
        search_tool_spec()
    }
}

pub fn search_tool_spec() -> ToolSpec {
    ToolSpec {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "A search engine optimized for comprehensive, accurate, and trusted results. \
                      Useful for answering questions about current events. \
                      Input should be a search query."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "search query to look up"}
            },
            "required": ["query"],
        }),
    }
}

/// Tavily search API client.
pub struct TavilySearch {
    config: SearchConfig,
}

impl TavilySearch {
    /// The API key is not checked here; a missing key fails each call instead.
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(SearchConfig::from_env())
    }
}

impl SearchTool for TavilySearch {
    fn search(&self, query: &str) -> Result<Value, StepError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| StepError::invalid("TAVILY_API_KEY is not set"))?;

        tracing::info!(query, "tavily search");
        let body = json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.config.max_results,
        });
        let response = http_post_json(&self.config.base_url, Some(api_key), &body, self.config.timeout)?;

        let results = response
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| StepError::invalid("search response has no results"))?;

        Ok(Value::Array(
            results
                .iter()
                .map(|hit| json!({"url": hit["url"], "content": hit["content"]}))
                .collect(),
        ))
    }
}

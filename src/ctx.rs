use crate::config::{LlmConfig, SearchConfig};
use crate::llm::{ChatModel, LlmRequest, OpenAiChat, ToolSpec};
use crate::tools::{SearchTool, TavilySearch};
use crate::StepError;
use serde_json::Value;

/// Execution context for agents: the external services and their config.
///
/// A bare [`Ctx::new`] has no services attached; steps that need one record
/// the resulting call failure like any other.
pub struct Ctx {
    llm: Option<Box<dyn ChatModel>>,
    search: Option<Box<dyn SearchTool>>,
    config: LlmConfig,
}

impl Ctx {
    pub fn new() -> Self {
        Self {
            llm: None,
            search: None,
            config: LlmConfig::default(),
        }
    }

    /// OpenAI-compatible chat and Tavily search, configured from the environment.
    pub fn from_env() -> Self {
        Self::from_config(LlmConfig::from_env(), SearchConfig::from_env())
    }

    pub fn from_config(llm: LlmConfig, search: SearchConfig) -> Self {
        Self::new()
            .with_config(llm.clone())
            .with_llm(OpenAiChat::new(llm))
            .with_search(TavilySearch::new(search))
    }

    pub fn with_llm(mut self, model: impl ChatModel + 'static) -> Self {
        self.llm = Some(Box::new(model));
        self
    }

    pub fn with_search(mut self, tool: impl SearchTool + 'static) -> Self {
        self.search = Some(Box::new(tool));
        self
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Start a chat request using the configured model name and temperature.
    pub fn llm(&self) -> LlmRequest<'_> {
        LlmRequest::new(
            self.llm.as_deref().map(|model| model as &dyn ChatModel),
            &self.config.model,
            self.config.temperature,
        )
    }

    /// Declaration of the attached search tool, if any.
    pub fn search_spec(&self) -> Option<ToolSpec> {
        self.search.as_ref().map(|tool| tool.spec())
    }

    pub fn search(&self, query: &str) -> Result<Value, StepError> {
        let tool = self
            .search
            .as_deref()
            .ok_or_else(|| StepError::invalid("no search tool configured"))?;
        tool.search(query)
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ctx_has_no_services() {
        let ctx = Ctx::new();
        assert!(ctx.search_spec().is_none());
        assert!(ctx.search("q").is_err());
        assert!(ctx.llm().user("hi").send().is_err());
    }

    #[test]
    fn llm_request_uses_configured_model() {
        let ctx = Ctx::new().with_config(LlmConfig {
            model: "gpt-4o".into(),
            temperature: 0.2,
            ..LlmConfig::default()
        });
        let req = ctx.llm();
        assert_eq!(req.request().model, "gpt-4o");
        assert_eq!(req.request().temperature, 0.2);
    }

    #[test]
    fn from_config_attaches_both_services() {
        let ctx = Ctx::from_config(LlmConfig::default(), SearchConfig::default());
        assert!(ctx.search_spec().is_some());
        // keys are absent, so both calls fail without touching the network
        assert!(ctx.search("q").unwrap_err().to_string().contains("TAVILY_API_KEY"));
        assert!(
            ctx.llm()
                .user("hi")
                .send()
                .unwrap_err()
                .to_string()
                .contains("OPENAI_API_KEY")
        );
    }
}

//! Tools exposed by the MCP server.
//!
//! Argument structs double as the advertised `inputSchema`: their field
//! docs become parameter descriptions.

use crate::llm::LanguageModel;
use crate::pipeline::ResearchWorkflow;
use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResearchArgs {
    /// The topic to research
    pub research_topic: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TranslateArgs {
    /// The target language
    pub target_language: String,
    /// The text to translate
    pub text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MathArgs {
    /// The first float
    pub a: f64,
    /// The second float
    pub b: f64,
}

/// The `research` MCP server: the pipeline plus the translate and math tools.
#[derive(Clone)]
pub struct ResearchServer {
    tool_router: ToolRouter<Self>,
    workflow: Arc<ResearchWorkflow>,
    model: Arc<dyn LanguageModel>,
}

#[tool_router]
impl ResearchServer {
    pub fn new(workflow: Arc<ResearchWorkflow>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            workflow,
            model,
        }
    }

    /// Run a fresh pipeline; the result text is exactly the summary.
    #[tool(description = "Research the given topic.")]
    pub async fn research(
        &self,
        params: Parameters<ResearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let topic = params.0.research_topic;
        info!("Research requested for '{}'", topic);

        Ok(match self.workflow.run(&topic).await {
            Ok(state) => CallToolResult::success(vec![Content::text(state.summary)]),
            Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
        })
    }

    #[tool(description = "Translate the given text to the target language.")]
    pub async fn translate(
        &self,
        params: Parameters<TranslateArgs>,
    ) -> Result<CallToolResult, McpError> {
        let TranslateArgs {
            target_language,
            text,
        } = params.0;
        info!("Translating text to {}", target_language);

        let input = format!(
            "Translate the following text to {}: {}",
            target_language, text
        );
        Ok(
            match self.model.generate_text(TRANSLATE_SYSTEM_PROMPT, &input).await {
                Ok(translation) => CallToolResult::success(vec![Content::text(translation)]),
                Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
            },
        )
    }

    #[tool(description = "Add two floats.")]
    pub async fn add(&self, params: Parameters<MathArgs>) -> Result<CallToolResult, McpError> {
        Ok(arithmetic("add", params.0, |a, b| a + b))
    }

    #[tool(description = "Subtract two floats.")]
    pub async fn subtract(
        &self,
        params: Parameters<MathArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(arithmetic("subtract", params.0, |a, b| a - b))
    }

    #[tool(description = "Multiply two floats.")]
    pub async fn multiply(
        &self,
        params: Parameters<MathArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(arithmetic("multiply", params.0, |a, b| a * b))
    }

    #[tool(description = "Divide two floats. Returns 0 if dividing by zero.")]
    pub async fn divide(&self, params: Parameters<MathArgs>) -> Result<CallToolResult, McpError> {
        Ok(arithmetic("divide", params.0, |a, b| {
            if b == 0.0 {
                0.0
            } else {
                a / b
            }
        }))
    }
}

impl ResearchServer {
    /// Every tool the server advertises, as `tools/list` reports them.
    pub fn tool_list() -> Vec<Tool> {
        Self::tool_router().list_all()
    }
}

#[tool_handler]
impl ServerHandler for ResearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Web research: `research` plans queries, reads matching pages and returns a markdown summary."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const TRANSLATE_SYSTEM_PROMPT: &str =
    "You are a professional translator. Reply with the translated text only.";

fn arithmetic(name: &str, args: MathArgs, op: impl Fn(f64, f64) -> f64) -> CallToolResult {
    debug!("Executing tool: {} with a={} b={}", name, args.a, args.b);
    // Rendered as a JSON number so whole results keep their ".0"
    CallToolResult::success(vec![Content::text(json!(op(args.a, args.b)).to_string())])
}

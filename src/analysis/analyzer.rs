use super::document::Document;
use crate::config::Config;
use anyhow::{Context, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

const PREVIEW_CHARS: usize = 400;
const SIMULATED_SCORE: u8 = 75;

/// Per-batch analysis parameters
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub temperature: f32,
}

impl AnalysisRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prompt: config.analysis_prompt.clone(),
            temperature: config.temperature,
        }
    }
}

/// Scores a single document; the backing service is opaque
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn is_simulated(&self) -> bool;

    async fn analyze(&self, document: &Document, request: &AnalysisRequest) -> Result<String>;
}

/// Placeholder used when no agent service is configured
pub struct SimulatedAnalyzer;

#[async_trait]
impl Analyzer for SimulatedAnalyzer {
    fn is_simulated(&self) -> bool {
        true
    }

    async fn analyze(&self, document: &Document, request: &AnalysisRequest) -> Result<String> {
        let preview: String = document.preview().chars().take(PREVIEW_CHARS).collect();
        Ok(format!(
            "**File:** {}\n\nSimulated summary: {}...\n\nEstimated score: {}/100 (temperature {:.2})\n",
            document.name, preview, SIMULATED_SCORE, request.temperature
        ))
    }
}

/// Résumé analyst backed by an OpenAI-compatible chat endpoint
pub struct AgentAnalyzer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl AgentAnalyzer {
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(api_url.to_string())
            .with_api_key(api_key.to_string());

        Self {
            client: Client::with_config(openai_config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for AgentAnalyzer {
    fn is_simulated(&self) -> bool {
        false
    }

    async fn analyze(&self, document: &Document, request: &AnalysisRequest) -> Result<String> {
        tracing::info!("Analyzing document: {}", document.name);

        let system = "You are a résumé analyst. Your goal is to triage candidates quickly \
                      in an initial screening. You are a technical recruiting specialist \
                      experienced with high-volume screening.";
        let user = format!(
            "Analyze the résumé `{}` and produce a structured summary with the main \
             skills and a fit score.\n\nInstructions: {}\n\nRésumé content:\n{}",
            document.name,
            request.prompt,
            document.preview()
        );

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(request.temperature)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .context("Failed to build system message")?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .context("Failed to build user message")?
                    .into(),
            ])
            .build()
            .context("Failed to build analysis request")?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .context("Analysis API call failed")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Analysis response contained no text")?;

        tracing::info!("Analysis complete: {} chars", text.len());
        Ok(text)
    }
}

/// Pick the agent-backed analyzer when a key is configured, else the simulation
pub fn select_analyzer(config: &Config) -> Box<dyn Analyzer> {
    match config.api_key() {
        Some(key) => Box::new(AgentAnalyzer::new(&config.api_url, key, &config.model)),
        None => {
            tracing::warn!(
                "No api_key configured; showing simulated analysis instead of agent results"
            );
            Box::new(SimulatedAnalyzer)
        }
    }
}

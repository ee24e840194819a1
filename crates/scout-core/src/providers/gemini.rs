//! Google Gemini provider (AI Studio and Vertex AI backends)

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::*;
use crate::credentials::Credentials;

const AI_STUDIO_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where requests go and how they are authenticated
#[derive(Clone)]
enum Backend {
    AiStudio {
        api_key: String,
    },
    Vertex {
        access_token: Option<String>,
    },
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    model: String,
    base_url: String,
    backend: Backend,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            Backend::AiStudio { .. } => "ai_studio",
            Backend::Vertex { .. } => "vertex",
        };
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("backend", &backend)
            .field("credentials", &"[REDACTED]")
            .finish()
    }
}

impl GeminiProvider {
    /// Provider using an AI Studio API key
    pub fn with_api_key(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            base_url: AI_STUDIO_BASE_URL.to_string(),
            backend: Backend::AiStudio {
                api_key: api_key.into(),
            },
        }
    }

    /// Provider for whichever backend the resolved credentials select
    pub fn from_credentials(model: impl Into<String>, credentials: &Credentials) -> Self {
        match credentials {
            Credentials::ApiKey(key) => Self::with_api_key(model, key.clone()),
            Credentials::VertexAi {
                project,
                location,
                access_token,
            } => Self {
                client: Client::new(),
                model: model.into(),
                base_url: format!(
                    "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google"
                ),
                backend: Backend::Vertex {
                    access_token: access_token.clone(),
                },
            },
        }
    }

    /// Point the provider at another endpoint (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        builtins: &[BuiltInTool],
        system: &str,
    ) -> Result<ChatResponse> {
        let body = build_request(messages, tools, builtins, system);
        let url = self.endpoint();
        debug!(
            "Gemini request to {} ({} messages, {} tools)",
            url,
            messages.len(),
            tools.len() + builtins.len()
        );

        let mut req = self.client.post(&url).json(&body);
        req = match &self.backend {
            Backend::AiStudio { api_key } => req.header("x-goog-api-key", api_key),
            Backend::Vertex {
                access_token: Some(token),
            } => req.bearer_auth(token),
            Backend::Vertex { access_token: None } => {
                warn!("Vertex AI selected without GOOGLE_CLOUD_ACCESS_TOKEN; sending unauthenticated request");
                req
            }
        };

        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to reach Gemini at {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error: HTTP {} — {}", status, body));
        }

        let parsed: GenerateContentResponse =
            resp.json().await.context("Failed to parse Gemini response")?;
        parse_response(parsed)
    }
}

// ── Wire types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<Vec<FunctionDeclaration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<GoogleSearch>,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn text_part(text: String) -> Part {
    Part {
        text: Some(text),
        ..Default::default()
    }
}

fn to_content(message: &ChatMessage) -> Content {
    let role = match message.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    };
    let parts = match &message.content {
        ChatMessageContent::Text(text) => vec![text_part(text.clone())],
        ChatMessageContent::Blocks(blocks) => blocks
            .iter()
            .map(|block| match block {
                ChatBlock::Text { text } => text_part(text.clone()),
                ChatBlock::ToolCall { id, name, input } => Part {
                    function_call: Some(FunctionCall {
                        id: Some(id.clone()),
                        name: name.clone(),
                        args: input.clone(),
                    }),
                    ..Default::default()
                },
                ChatBlock::ToolResult {
                    tool_call_id,
                    name,
                    content,
                } => Part {
                    function_response: Some(FunctionResponse {
                        id: Some(tool_call_id.clone()),
                        name: name.clone(),
                        response: tool_response_object(content),
                    }),
                    ..Default::default()
                },
            })
            .collect(),
    };
    Content {
        role: Some(role.to_string()),
        parts,
    }
}

/// Gemini requires `functionResponse.response` to be a JSON object
fn tool_response_object(content: &str) -> Value {
    match serde_json::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => value,
        _ => serde_json::json!({ "result": content }),
    }
}

fn build_request(
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
    builtins: &[BuiltInTool],
    system: &str,
) -> GenerateContentRequest {
    let mut wire_tools = Vec::new();
    if !tools.is_empty() {
        wire_tools.push(Tool {
            function_declarations: Some(
                tools
                    .iter()
                    .map(|t| FunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    })
                    .collect(),
            ),
            google_search: None,
        });
    }
    for builtin in builtins {
        match builtin {
            BuiltInTool::GoogleSearch => wire_tools.push(Tool {
                function_declarations: None,
                google_search: Some(GoogleSearch {}),
            }),
        }
    }

    let system = system.trim();
    GenerateContentRequest {
        contents: messages.iter().map(to_content).collect(),
        system_instruction: (!system.is_empty()).then(|| Content {
            role: None,
            parts: vec![text_part(system.to_string())],
        }),
        tools: wire_tools,
    }
}

fn parse_response(resp: GenerateContentResponse) -> Result<ChatResponse> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini returned no candidates"))?;

    let mut blocks = Vec::new();
    for (i, part) in candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .enumerate()
    {
        if let Some(call) = part.function_call {
            blocks.push(ChatResponseBlock::ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{}", i)),
                name: call.name,
                input: call.args,
            });
        } else if let Some(text) = part.text {
            blocks.push(ChatResponseBlock::Text { text });
        }
    }

    let has_calls = blocks
        .iter()
        .any(|b| matches!(b, ChatResponseBlock::ToolCall { .. }));
    let stop_reason = if has_calls {
        StopReason::ToolUse
    } else {
        match candidate.finish_reason.as_deref() {
            Some("STOP") => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            _ => StopReason::Unknown,
        }
    };

    let usage = resp
        .usage_metadata
        .map(|u| ChatUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        blocks,
        stop_reason,
        usage,
    })
}

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::DevnetSettings;
use crate::error::LLMError;
use crate::http::HttpRequest;
use crate::provider::{LLMProvider, extract_think_answer};
use crate::types::{ChatMessage, ChatOptions, ChatResponse, StreamChunk};

/// 约定使用思考模型的 model_name
const THINKING_MODEL_NAME: &str = "deepseek";

/// 研发网自建模型 Provider 指令/思考双模型按名字路由
///
/// 思考痕迹内联在回答文本里 以 `<think>` 标记分隔 非流式路径事后拆分
/// 流式路径不打 thinking 标记
pub struct DevnetProvider {
    instruct_model: String,
    instruct_url: String,
    thinking_model: String,
    thinking_url: String,
    default_top_p: f32,
}

impl DevnetProvider {
    /// 由已解析的配置创建 Provider
    pub fn new(settings: DevnetSettings) -> Self {
        Self {
            instruct_model: settings.instruct_model,
            instruct_url: settings.instruct_url,
            thinking_model: settings.thinking_model,
            thinking_url: settings.thinking_url,
            default_top_p: settings.default_top_p,
        }
    }

    /// 按模型名约定选择 模型/URL 对
    fn model_info(&self, model_name: &str) -> (&str, &str) {
        if model_name == THINKING_MODEL_NAME {
            (&self.thinking_model, &self.thinking_url)
        } else {
            (&self.instruct_model, &self.instruct_url)
        }
    }
}

#[derive(Debug, Deserialize)]
struct DevnetResponsePayload {
    choices: Vec<DevnetResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct DevnetResponseChoice {
    message: DevnetResponseMessage,
}

#[derive(Debug, Deserialize)]
struct DevnetResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct DevnetStreamPayload {
    choices: Vec<DevnetStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct DevnetStreamChoice {
    #[serde(default)]
    delta: DevnetStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DevnetStreamDelta {
    content: Option<String>,
}

impl LLMProvider for DevnetProvider {
    fn build_request(
        &self,
        messages: &[ChatMessage],
        model_name: &str,
        stream: bool,
        options: &ChatOptions,
    ) -> Result<HttpRequest, LLMError> {
        let (model, url) = self.model_info(model_name);

        let mut body = Map::new();
        body.insert("model".to_string(), Value::String(model.to_string()));
        body.insert(
            "messages".to_string(),
            serde_json::to_value(messages)
                .map_err(|err| LLMError::build(format!("failed to serialize messages: {err}")))?,
        );
        body.insert("stream".to_string(), Value::Bool(stream));
        body.insert(
            "top_p".to_string(),
            Value::from(options.top_p.unwrap_or(self.default_top_p)),
        );
        // 设定值与实际输入 tokens 相加不能超过模型上下文 否则接口报错
        if let Some(max_tokens) = options.max_tokens {
            body.insert("max_tokens".to_string(), Value::from(max_tokens));
        }

        let payload = serde_json::to_vec(&Value::Object(body))
            .map_err(|err| LLMError::build(format!("failed to serialize request: {err}")))?;
        Ok(HttpRequest::post_json(url, payload))
    }

    fn parse_response(&self, body: &str) -> Result<ChatResponse, LLMError> {
        let payload: DevnetResponsePayload = serde_json::from_str(body)
            .map_err(|err| LLMError::parse(format!("devnet response shape mismatch: {err}"), body))?;
        let full_text = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::parse("devnet response has no choices", body))?
            .message
            .content;

        let (think, answer) = extract_think_answer(&full_text);
        Ok(ChatResponse {
            think: (!think.is_empty()).then_some(think),
            answer,
        })
    }

    fn parse_stream_line(&self, line: &str) -> Option<StreamChunk> {
        let data = line.strip_prefix("data:")?.trim();
        if data == "[DONE]" {
            return Some(StreamChunk {
                content: String::new(),
                is_thinking: false,
                is_final: true,
            });
        }

        let payload: DevnetStreamPayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(line, error = %err, "failed to decode devnet stream line, skipping");
                return None;
            }
        };
        let Some(choice) = payload.choices.into_iter().next() else {
            warn!(line, "devnet stream payload carries no choices, skipping");
            return None;
        };

        Some(StreamChunk {
            content: choice.delta.content.unwrap_or_default(),
            is_thinking: false,
            is_final: choice.finish_reason.is_some(),
        })
    }

    fn name(&self) -> &'static str {
        "devnet"
    }
}

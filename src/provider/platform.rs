use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::LLMError;
use crate::http::HttpRequest;
use crate::provider::LLMProvider;
use crate::types::{ChatMessage, ChatOptions, ChatResponse, StreamChunk};

/// 约定使用思考模型的 model_name
const THINKING_MODEL_NAME: &str = "deepseek";

/// 非思考模式的控制后缀 追加到最后一条消息抑制推理输出
const NO_THINK_SUFFIX: &str = " /no_think";

/// 人工智能平台 Provider OpenAI 兼容 choices/delta 结构
///
/// 思考痕迹经 `reasoning_content` 旁路字段下发 流式块据此打 thinking 标记
pub struct PlatformProvider {
    url: String,
    model: String,
    api_key: String,
}

impl PlatformProvider {
    /// 创建 Provider url/model 来自已解析配置 api_key 为 Bearer 令牌
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// 非思考模型时在末条消息追加控制后缀
    fn apply_thinking_flag(&self, messages: &[ChatMessage], model_name: &str) -> Vec<ChatMessage> {
        let mut messages = messages.to_vec();
        if model_name != THINKING_MODEL_NAME {
            if let Some(last) = messages.last_mut() {
                last.content.push_str(NO_THINK_SUFFIX);
            }
        }
        messages
    }
}

#[derive(Debug, Deserialize)]
struct PlatformResponsePayload {
    choices: Vec<PlatformResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct PlatformResponseChoice {
    message: PlatformResponseMessage,
}

#[derive(Debug, Deserialize)]
struct PlatformResponseMessage {
    content: String,
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlatformStreamPayload {
    choices: Vec<PlatformStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct PlatformStreamChoice {
    #[serde(default)]
    delta: PlatformStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlatformStreamDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
}

impl LLMProvider for PlatformProvider {
    fn build_request(
        &self,
        messages: &[ChatMessage],
        model_name: &str,
        stream: bool,
        options: &ChatOptions,
    ) -> Result<HttpRequest, LLMError> {
        let messages = self.apply_thinking_flag(messages, model_name);

        let mut body = Map::new();
        body.insert("model".to_string(), Value::String(self.model.clone()));
        body.insert(
            "messages".to_string(),
            serde_json::to_value(&messages)
                .map_err(|err| LLMError::build(format!("failed to serialize messages: {err}")))?,
        );
        body.insert("stream".to_string(), Value::Bool(stream));
        // 平台侧关闭思考 reasoning_content 旁路仍按存在处理
        body.insert("enable_thinking".to_string(), Value::Bool(false));
        if let Some(temperature) = options.temperature {
            body.insert("temperature".to_string(), Value::from(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            body.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        if let Some(penalty) = options.presence_penalty {
            body.insert("presence_penalty".to_string(), Value::from(penalty));
        }

        let payload = serde_json::to_vec(&Value::Object(body))
            .map_err(|err| LLMError::build(format!("failed to serialize request: {err}")))?;
        Ok(HttpRequest::post_json(&self.url, payload)
            .with_header("Authorization", format!("Bearer {}", self.api_key)))
    }

    fn parse_response(&self, body: &str) -> Result<ChatResponse, LLMError> {
        let payload: PlatformResponsePayload = serde_json::from_str(body).map_err(|err| {
            LLMError::parse(format!("platform response shape mismatch: {err}"), body)
        })?;
        let message = payload
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::parse("platform response has no choices", body))?
            .message;

        Ok(ChatResponse {
            think: message.reasoning_content.filter(|think| !think.is_empty()),
            answer: message.content,
        })
    }

    fn parse_stream_line(&self, line: &str) -> Option<StreamChunk> {
        let data = line.strip_prefix("data:")?.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }

        let payload: PlatformStreamPayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(line, error = %err, "failed to decode platform stream line, skipping");
                return None;
            }
        };
        let Some(choice) = payload.choices.into_iter().next() else {
            warn!(line, "platform stream payload carries no choices, skipping");
            return None;
        };

        let is_final = choice.finish_reason.is_some();
        let think_content = choice.delta.reasoning_content.unwrap_or_default();
        if !think_content.is_empty() {
            return Some(StreamChunk {
                content: think_content,
                is_thinking: true,
                is_final,
            });
        }

        Some(StreamChunk {
            content: choice.delta.content.unwrap_or_default(),
            is_thinking: false,
            is_final,
        })
    }

    fn name(&self) -> &'static str {
        "platform"
    }
}

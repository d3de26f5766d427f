use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::engine;
use crate::error::LLMError;
use crate::http::DynHttpTransport;
use crate::provider::{ChatStream, DynProvider};
use crate::types::{ChatMessage, ChatOptions, ChatResponse};

/// LLM 调用入口 绑定单个 Provider 与共享传输层
///
/// 每次调用生成独立的 request_id 并以 tracing span 贯穿始终 无论成功
/// 失败或提前放弃 span 随调用结束释放
pub struct LLMClient {
    provider: DynProvider,
    transport: DynHttpTransport,
}

impl LLMClient {
    /// 组合 Provider 与传输层
    pub fn new(provider: DynProvider, transport: DynHttpTransport) -> Self {
        Self {
            provider,
            transport,
        }
    }

    /// 发送非流式聊天请求 返回完整响应
    pub async fn chat(
        &self,
        prompt: &str,
        history: Vec<ChatMessage>,
        model_name: &str,
        options: &ChatOptions,
    ) -> Result<ChatResponse, LLMError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "llm_chat",
            %request_id,
            provider = self.provider.name(),
            model = model_name,
        );

        async {
            info!("handling chat request");
            let messages = assemble_messages(history, prompt);
            let result = match self
                .provider
                .build_request(&messages, model_name, false, options)
            {
                Ok(request) => engine::get_response(&self.transport, &self.provider, request).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(response) => {
                    info!("chat request completed");
                    Ok(response)
                }
                Err(err) => {
                    error!(error = %err, "chat request failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// 发起流式聊天请求 返回惰性块序列
    ///
    /// 连接在本方法内建立并校验状态 非 2xx 在产出任何块之前即失败
    /// 消费方提前丢弃序列时底层连接随之释放
    pub async fn stream_chat(
        &self,
        prompt: &str,
        history: Vec<ChatMessage>,
        model_name: &str,
        options: &ChatOptions,
    ) -> Result<ChatStream, LLMError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "llm_stream_chat",
            %request_id,
            provider = self.provider.name(),
            model = model_name,
        );

        async {
            info!("handling streaming chat request");
            let messages = assemble_messages(history, prompt);
            let result = match self
                .provider
                .build_request(&messages, model_name, true, options)
            {
                Ok(request) => {
                    engine::get_stream_response(
                        &self.transport,
                        self.provider.clone(),
                        request,
                        request_id.clone(),
                    )
                    .await
                }
                Err(err) => Err(err),
            };
            match result {
                Ok(stream) => {
                    info!("streaming chat request accepted");
                    Ok(stream)
                }
                Err(err) => {
                    error!(error = %err, "streaming chat request failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// 历史在前 新的用户消息在后
fn assemble_messages(mut history: Vec<ChatMessage>, prompt: &str) -> Vec<ChatMessage> {
    history.push(ChatMessage::user(prompt));
    history
}

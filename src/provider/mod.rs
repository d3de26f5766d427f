use std::pin::Pin;
use std::sync::Arc;

use futures_core::Stream;

use crate::error::LLMError;
use crate::http::HttpRequest;
use crate::types::{ChatMessage, ChatOptions, ChatResponse, StreamChunk};

pub mod devnet;
pub mod platform;

/// 流式响应别名
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LLMError>> + Send>>;

/// 统一的 Provider Trait 所有供应商实现三个解析构建操作即可接入
///
/// 网络收发与 SSE 逐行解码由共享引擎统一承担 Provider 只负责协议差异部分
pub trait LLMProvider: Send + Sync {
    /// 由规范化输入构建完整的出站请求 纯函数
    fn build_request(
        &self,
        messages: &[ChatMessage],
        model_name: &str,
        stream: bool,
        options: &ChatOptions,
    ) -> Result<HttpRequest, LLMError>;

    /// 解析非流式响应体 形状不符时返回携带原始报文的 Parse 错误
    fn parse_response(&self, body: &str) -> Result<ChatResponse, LLMError>;

    /// 解析单行 SSE 数据 非数据行/控制行/坏行返回 None 坏行记日志不抛错
    fn parse_stream_line(&self, line: &str) -> Option<StreamChunk>;

    /// 供应商名称
    fn name(&self) -> &'static str;
}

/// 线程安全 Provider
pub type DynProvider = Arc<dyn LLMProvider>;

/// 从内联了思考标记的完整文本中拆出思考与回答两段。
///
/// 按首个 `</think>` 切分：之前的部分去掉 `<think>` 标记并修剪空白作为
/// 思考，其余修剪后作为回答。没有标记时原文整体作为回答返回。
///
/// # Examples
///
/// ```
/// use hashi_llm::provider::extract_think_answer;
///
/// assert_eq!(
///     extract_think_answer("<think>A</think>B"),
///     ("A".to_string(), "B".to_string())
/// );
/// assert_eq!(extract_think_answer("B"), (String::new(), "B".to_string()));
/// ```
pub fn extract_think_answer(text: &str) -> (String, String) {
    match text.split_once("</think>") {
        Some((head, tail)) => (
            head.replace("<think>", "").trim().to_string(),
            tail.trim().to_string(),
        ),
        None => (String::new(), text.to_string()),
    }
}

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use tracing::{error, warn};

use crate::error::LLMError;
use crate::http::{DynHttpTransport, HttpBodyStream, HttpRequest};
use crate::provider::{ChatStream, DynProvider};
use crate::stream::SseLineStream;
use crate::types::{ChatResponse, StreamChunk};

/// 流式长生成场景的读超时
pub(crate) const STREAM_READ_TIMEOUT: Duration = Duration::from_secs(120);

/// 发送非流式请求 校验状态后交由 Provider 解析
///
/// 非 2xx 不尝试解析 直接返回携带状态与响应体的错误 解析失败原样上抛
pub(crate) async fn get_response(
    transport: &DynHttpTransport,
    provider: &DynProvider,
    request: HttpRequest,
) -> Result<ChatResponse, LLMError> {
    let response = transport.send(request).await?;
    let status = response.status;
    let body = response.into_string()?;
    if !(200..300).contains(&status) {
        error!(status, body = %body, "upstream rejected chat request");
        return Err(LLMError::HttpStatus { status, body });
    }
    provider.parse_response(&body)
}

/// 发起流式请求 返回惰性块序列
///
/// 非 2xx 在产出任何块之前失败 中途传输故障以 Err 项终止序列
pub(crate) async fn get_stream_response(
    transport: &DynHttpTransport,
    provider: DynProvider,
    mut request: HttpRequest,
    request_id: String,
) -> Result<ChatStream, LLMError> {
    request.timeout = Some(STREAM_READ_TIMEOUT);
    let response = transport.send_stream(request).await?;
    if !(200..300).contains(&response.status) {
        let status = response.status;
        let body = collect_error_body(response.body).await?;
        error!(status, body = %body, "upstream rejected streaming chat request");
        return Err(LLMError::HttpStatus { status, body });
    }
    Ok(Box::pin(ChunkStream {
        lines: SseLineStream::new(response.body),
        provider,
        request_id,
    }))
}

/// 出错时把剩余响应体收完用于诊断
async fn collect_error_body(mut body: HttpBodyStream) -> Result<String, LLMError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 将 SSE 行流逐行交给 Provider 解析出的规范化块流
///
/// 单行解码失败只丢弃该行 序列继续 传输层错误向下游透传
struct ChunkStream {
    lines: SseLineStream,
    provider: DynProvider,
    request_id: String,
}

impl Stream for ChunkStream {
    type Item = Result<StreamChunk, LLMError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match Pin::new(&mut this.lines).poll_next(cx) {
                Poll::Ready(Some(Ok(line))) => {
                    if !line.starts_with("data:") {
                        continue;
                    }
                    if let Some(chunk) = this.provider.parse_stream_line(&line) {
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                }
                Poll::Ready(Some(Err(LLMError::StreamDecode { message, line }))) => {
                    warn!(
                        request_id = %this.request_id,
                        line = %line,
                        message = %message,
                        "dropping undecodable stream line"
                    );
                }
                Poll::Ready(Some(Err(err))) => {
                    error!(
                        request_id = %this.request_id,
                        error = %err,
                        "stream terminated by transport fault"
                    );
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

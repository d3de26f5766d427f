use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::LLMError;
use crate::http::HttpBodyStream;

/// Splits a raw HTTP body into complete SSE lines.
///
/// Byte chunks arrive with arbitrary boundaries; this adapter buffers them
/// and yields one item per `\n`-terminated line, with any trailing `\r`
/// removed. A partial line left in the buffer when the body closes is
/// flushed as the last item. One line that is not valid UTF-8 yields a
/// [`LLMError::StreamDecode`] for that line only; the stream continues.
pub struct SseLineStream {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    body_closed: bool,
}

impl SseLineStream {
    /// Wraps a raw body stream for line-oriented decoding.
    pub fn new(body: HttpBodyStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            body_closed: false,
        }
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }

    fn decode(line: Vec<u8>) -> Result<String, LLMError> {
        String::from_utf8(line).map_err(|err| LLMError::StreamDecode {
            message: format!("invalid UTF-8 in stream line: {err}"),
            line: String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}

impl Stream for SseLineStream {
    type Item = Result<String, LLMError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(line) = Self::drain_line(&mut this.buffer) {
                return Poll::Ready(Some(Self::decode(line)));
            }

            if this.body_closed {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                let tail: Vec<u8> = this.buffer.drain(..).collect();
                return Poll::Ready(Some(Self::decode(tail)));
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => {
                    this.body_closed = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

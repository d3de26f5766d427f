use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use hashi_llm::LLMClient;
use hashi_llm::config::{Credential, PlatformSettings, ProviderConfig, build_client};
use hashi_llm::error::LLMError;
use hashi_llm::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};
use hashi_llm::types::{ChatOptions, ChatResponse, StreamChunk};

/// 回放固定响应并记录出站请求的测试传输层
struct RecordingTransport {
    status: u16,
    body: &'static str,
    stream_chunks: Vec<&'static [u8]>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    fn new(status: u16, body: &'static str, stream_chunks: Vec<&'static [u8]>) -> Self {
        Self {
            status,
            body,
            stream_chunks,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        self.seen.lock().expect("lock").push(request);
        Ok(HttpResponse {
            status: self.status,
            headers: HashMap::new(),
            body: self.body.as_bytes().to_vec(),
        })
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
        self.seen.lock().expect("lock").push(request);
        let chunks: Vec<Result<Vec<u8>, LLMError>> = self
            .stream_chunks
            .iter()
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        Ok(HttpStreamResponse {
            status: self.status,
            headers: HashMap::new(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

fn platform_client(transport: Arc<RecordingTransport>) -> LLMClient {
    let config = ProviderConfig::Platform(PlatformSettings {
        url: "http://platform.local/v1/chat/completions".to_string(),
        model: "qwen3-32b".to_string(),
        credential: Credential::Bearer {
            token: "test-token".to_string(),
        },
    });
    build_client(&config, transport).expect("client")
}

#[tokio::test]
async fn chat_returns_reasoning_side_channel_as_think() {
    let transport = Arc::new(RecordingTransport::new(
        200,
        r#"{"choices":[{"message":{"content":"hi","reasoning_content":"because"}}]}"#,
        Vec::new(),
    ));
    let client = platform_client(transport.clone());

    let response = client
        .chat("greet me", Vec::new(), "default", &ChatOptions::default())
        .await
        .expect("chat should succeed");
    assert_eq!(
        response,
        ChatResponse {
            think: Some("because".to_string()),
            answer: "hi".to_string(),
        }
    );

    // 出站请求应携带 Bearer 头与 /no_think 后缀
    let seen = transport.seen.lock().expect("lock");
    let request = seen.first().expect("one request");
    assert_eq!(
        request.headers.get("Authorization").unwrap(),
        "Bearer test-token"
    );
    let body: serde_json::Value =
        serde_json::from_slice(request.body.as_deref().expect("body")).expect("json");
    assert_eq!(body["messages"][0]["content"], "greet me /no_think");
    assert_eq!(body["enable_thinking"], false);
}

#[tokio::test]
async fn chat_maps_http_500_to_status_error() {
    let transport = Arc::new(RecordingTransport::new(500, "boom", Vec::new()));
    let client = platform_client(transport);

    let err = client
        .chat("hi", Vec::new(), "default", &ChatOptions::default())
        .await
        .unwrap_err();
    match err {
        LLMError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error type: {other:?}"),
    }
}

#[tokio::test]
async fn stream_chat_tags_reasoning_chunks_before_answer() {
    let transport = Arc::new(RecordingTransport::new(
        200,
        "",
        vec![
            b"data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"mull \"},\"finish_reason\":null}]}\n" as &[u8],
            b"data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"it over\"},\"finish_reason\":null}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"short \"},\"finish_reason\":null}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"answer\"},\"finish_reason\":\"stop\"}]}\n",
            b"data: [DONE]\n",
        ],
    ));
    let client = platform_client(transport);

    let stream = client
        .stream_chat("hi", Vec::new(), "default", &ChatOptions::default())
        .await
        .expect("stream should open");
    let chunks: Vec<StreamChunk> = stream.map(|item| item.expect("chunk")).collect().await;

    // 平台适配器吞掉 DONE 哨兵 不额外产出终止块
    assert_eq!(chunks.len(), 4);
    assert!(chunks[0].is_thinking && chunks[1].is_thinking);
    assert!(!chunks[2].is_thinking && !chunks[3].is_thinking);
    assert!(chunks[3].is_final);

    let rebuilt = ChatResponse::from_chunks(&chunks);
    assert_eq!(rebuilt.think.as_deref(), Some("mull it over"));
    assert_eq!(rebuilt.answer, "short answer");
}

#[tokio::test]
async fn streamed_answer_matches_unary_answer() {
    let unary_transport = Arc::new(RecordingTransport::new(
        200,
        r#"{"choices":[{"message":{"content":"short answer","reasoning_content":"mull it over"}}]}"#,
        Vec::new(),
    ));
    let unary = platform_client(unary_transport)
        .chat("hi", Vec::new(), "default", &ChatOptions::default())
        .await
        .expect("unary chat");

    let stream_transport = Arc::new(RecordingTransport::new(
        200,
        "",
        vec![
            b"data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"mull it over\"},\"finish_reason\":null}]}\n" as &[u8],
            b"data: {\"choices\":[{\"delta\":{\"content\":\"short \"},\"finish_reason\":null}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"answer\"},\"finish_reason\":\"stop\"}]}\n",
            b"data: [DONE]\n",
        ],
    ));
    let stream = platform_client(stream_transport)
        .stream_chat("hi", Vec::new(), "default", &ChatOptions::default())
        .await
        .expect("stream");
    let chunks: Vec<StreamChunk> = stream.map(|item| item.expect("chunk")).collect().await;
    let rebuilt = ChatResponse::from_chunks(&chunks);

    assert_eq!(rebuilt, unary);
}

#[tokio::test]
async fn mid_stream_transport_fault_reaches_consumer() {
    /// 先给一块数据再断开的传输层
    struct FlakyTransport;

    #[async_trait]
    impl HttpTransport for FlakyTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, LLMError> {
            panic!("unary path is not used in this test");
        }

        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
            let chunks: Vec<Result<Vec<u8>, LLMError>> = vec![
                Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"early\"},\"finish_reason\":null}]}\n".to_vec()),
                Err(LLMError::transport("read timed out")),
            ];
            Ok(HttpStreamResponse {
                status: 200,
                headers: HashMap::new(),
                body: Box::pin(stream::iter(chunks)),
            })
        }
    }

    let config = ProviderConfig::Platform(PlatformSettings {
        url: "http://platform.local/v1/chat/completions".to_string(),
        model: "qwen3-32b".to_string(),
        credential: Credential::Bearer {
            token: "test-token".to_string(),
        },
    });
    let client = build_client(&config, Arc::new(FlakyTransport)).expect("client");

    let mut stream = client
        .stream_chat("hi", Vec::new(), "default", &ChatOptions::default())
        .await
        .expect("stream should open");

    let first = stream.next().await.expect("item").expect("chunk");
    assert_eq!(first.content, "early");

    let err = stream.next().await.expect("item").unwrap_err();
    assert!(matches!(err, LLMError::Transport { .. }));
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::LLMClient;
use crate::error::LLMError;
use crate::http::DynHttpTransport;
use crate::provider::DynProvider;
use crate::provider::devnet::DevnetProvider;
use crate::provider::platform::PlatformProvider;

/// 鉴权信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Bearer Token
    Bearer { token: String },
    /// 无需鉴权的内网 provider
    None,
}

/// 研发网双模型配置 指令/思考两组 模型+URL
///
/// 所有字段由外层 settings 解析完毕后传入 本层不读取环境变量或文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevnetSettings {
    pub instruct_url: String,
    pub instruct_model: String,
    pub thinking_url: String,
    pub thinking_model: String,
    /// 调用方未显式传参时使用的 top_p
    #[serde(default = "default_top_p")]
    pub default_top_p: f32,
}

fn default_top_p() -> f32 {
    0.75
}

/// 人工智能平台配置 单模型 + Bearer 鉴权
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    pub url: String,
    pub model: String,
    pub credential: Credential,
}

/// 供应商配置 调用方选定一个 Provider 不做多供应商路由
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    Devnet(DevnetSettings),
    Platform(PlatformSettings),
}

/// 根据配置构建 Provider
pub fn build_provider(config: &ProviderConfig) -> Result<DynProvider, LLMError> {
    match config {
        ProviderConfig::Devnet(settings) => Ok(Arc::new(DevnetProvider::new(settings.clone()))),
        ProviderConfig::Platform(settings) => {
            let token = extract_bearer_token(&settings.credential, "platform")?;
            Ok(Arc::new(PlatformProvider::new(
                settings.url.clone(),
                settings.model.clone(),
                token,
            )))
        }
    }
}

/// 构建绑定好传输层的 LLMClient
pub fn build_client(
    config: &ProviderConfig,
    transport: DynHttpTransport,
) -> Result<LLMClient, LLMError> {
    Ok(LLMClient::new(build_provider(config)?, transport))
}

fn extract_bearer_token(
    credential: &Credential,
    provider: &'static str,
) -> Result<String, LLMError> {
    match credential {
        Credential::Bearer { token } => Ok(token.clone()),
        Credential::None => Err(LLMError::build(format!(
            "provider {provider} requires a bearer credential"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::reqwest::default_dyn_transport;

    fn devnet_config() -> ProviderConfig {
        ProviderConfig::Devnet(DevnetSettings {
            instruct_url: "http://devnet.local/instruct".to_string(),
            instruct_model: "qwen-instruct".to_string(),
            thinking_url: "http://devnet.local/thinking".to_string(),
            thinking_model: "deepseek-r1".to_string(),
            default_top_p: 0.75,
        })
    }

    /// 两类配置都应当能构建出可用的客户端
    #[test]
    fn build_client_supports_both_providers() {
        let transport = default_dyn_transport().expect("transport");

        build_client(&devnet_config(), transport.clone()).expect("devnet client");

        let platform = ProviderConfig::Platform(PlatformSettings {
            url: "http://platform.local/v1/chat".to_string(),
            model: "qwen3-32b".to_string(),
            credential: Credential::Bearer {
                token: "test-token".to_string(),
            },
        });
        build_client(&platform, transport).expect("platform client");
    }

    /// 平台 Provider 缺少 Bearer 凭证时拒绝构建
    #[test]
    fn platform_without_credential_is_rejected() {
        let config = ProviderConfig::Platform(PlatformSettings {
            url: "http://platform.local/v1/chat".to_string(),
            model: "qwen3-32b".to_string(),
            credential: Credential::None,
        });

        let err = match build_provider(&config) {
            Ok(_) => panic!("expected build error, got a provider"),
            Err(err) => err,
        };
        match err {
            LLMError::Build { message } => {
                assert!(
                    message.contains("platform"),
                    "unexpected build message: {message}"
                );
            }
            other => panic!("unexpected error type: {other:?}"),
        }
    }

    #[test]
    fn provider_config_deserializes_from_tagged_json() {
        let raw = r#"{
            "provider": "devnet",
            "instruct_url": "http://devnet.local/instruct",
            "instruct_model": "qwen-instruct",
            "thinking_url": "http://devnet.local/thinking",
            "thinking_model": "deepseek-r1"
        }"#;

        let config: ProviderConfig = serde_json::from_str(raw).expect("config");
        match config {
            ProviderConfig::Devnet(settings) => {
                assert_eq!(settings.instruct_model, "qwen-instruct");
                // 未给定时回落到默认 top_p
                assert!((settings.default_top_p - 0.75).abs() < 1e-6);
            }
            other => panic!("unexpected provider kind: {other:?}"),
        }
    }
}

use async_trait::async_trait;
use common::{
    Availability, MessagingProvider, ProviderFactory, ProviderInfo, PushError,
};
use log::*;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const PROVIDER_NAME: &str = "gcm";
const SERVICE_NOT_AVAILABLE: &str = "SERVICE_NOT_AVAILABLE";

fn default_timeout() -> u64 {
    30
}

/// 消息服务注册配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcmConfig {
    /// 注册接口地址
    pub registration_url: String,
    /// 应用包名
    pub app_id: String,
    /// 设备标识
    pub device_id: String,
    /// 超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// 基于HTTP注册接口的消息服务提供方
pub struct GcmProvider {
    config: GcmConfig,
    http_client: Client,
}

impl GcmProvider {
    pub fn new(config: GcmConfig) -> Result<Self, PushError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| PushError::Config(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> Option<Url> {
        Url::parse(&self.config.registration_url).ok()
    }
}

#[async_trait]
impl MessagingProvider for GcmProvider {
    async fn availability(&self) -> Result<Availability, PushError> {
        match self.endpoint() {
            Some(url) if matches!(url.scheme(), "http" | "https") => Ok(Availability::Available),
            _ => Ok(Availability::ServiceMissing),
        }
    }

    async fn register(&self, sender_id: &str) -> Result<Option<String>, PushError> {
        let form = [
            ("app", self.config.app_id.as_str()),
            ("device", self.config.device_id.as_str()),
            ("sender", sender_id),
        ];
        let response = self
            .http_client
            .post(&self.config.registration_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PushError::Io(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PushError::Io(e.to_string()))?;
        debug!("Registration endpoint answered {}: {}", status, text);

        if status.is_success() {
            parse_registration_response(&text)
        } else {
            Err(PushError::Io(format!(
                "Request failed with status: {}, body: {}",
                status, text
            )))
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoint: self.config.registration_url.clone(),
        }
    }
}

/// 解析注册接口的 `key=value` 响应
pub fn parse_registration_response(text: &str) -> Result<Option<String>, PushError> {
    for line in text.lines() {
        match line.trim().split_once('=') {
            Some(("token", token)) => return Ok(Some(token.to_string())),
            Some(("Error", SERVICE_NOT_AVAILABLE)) => {
                return Err(PushError::Io(SERVICE_NOT_AVAILABLE.to_string()));
            }
            Some(("Error", error)) => return Err(PushError::Platform(error.to_string())),
            _ => {}
        }
    }
    Ok(None)
}

// --- Provider Factory ---

pub struct GcmProviderFactory;

impl ProviderFactory for GcmProviderFactory {
    fn create(&self, config: Value) -> Result<Box<dyn MessagingProvider>, PushError> {
        let config: GcmConfig =
            serde_json::from_value(config).map_err(|e| PushError::Config(e.to_string()))?;
        Ok(Box::new(GcmProvider::new(config)?))
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

use anyhow::{Context, Result};
use common::ApplicationInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const CONFIG_ENV: &str = "LQD_PUSH_CONFIG";

/// 提供方配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// 提供方名称
    pub name: String,
    /// 提供方自身的配置，由对应工厂解析
    #[serde(default)]
    pub config: Value,
}

/// 宿主应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    pub package_name: String,
    pub launch_target: Option<String>,
    /// 为空时视为应用信息无法获取
    pub info: Option<ApplicationInfo>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            package_name: "io.lqd.sample".to_string(),
            launch_target: Some("io.lqd.sample.MainActivity".to_string()),
            info: Some(ApplicationInfo {
                label: "Liquid Sample".to_string(),
                icon: 0x7f02_0000,
                metadata: None,
            }),
        }
    }
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub sender_id: String,
    pub provider: Option<ProviderSection>,
    pub app: AppSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8888".to_string(),
            sender_id: String::new(),
            provider: None,
            app: AppSection::default(),
        }
    }
}

impl ServerConfig {
    /// 从环境变量指定的文件加载，未设置时使用默认配置
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ServerConfig::from_json(r#"{ "sender_id": "1234" }"#).unwrap();
        assert_eq!(config.sender_id, "1234");
        assert_eq!(config.bind, "127.0.0.1:8888");
        assert!(config.provider.is_none());
        assert_eq!(config.app.package_name, "io.lqd.sample");
    }

    #[test]
    fn test_provider_section() {
        let config = ServerConfig::from_json(
            r#"{
                "provider": {
                    "name": "gcm",
                    "config": { "registration_url": "https://push.example.com/register" }
                },
                "app": { "package_name": "com.example.app" }
            }"#,
        )
        .unwrap();
        let provider = config.provider.unwrap();
        assert_eq!(provider.name, "gcm");
        assert_eq!(
            provider.config["registration_url"],
            "https://push.example.com/register"
        );
        assert!(config.app.info.is_none());
        assert!(config.app.launch_target.is_none());
    }

    #[test]
    fn test_missing_file() {
        assert!(ServerConfig::from_file("/nonexistent/lqd_push.json").is_err());
    }
}

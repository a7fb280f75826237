use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 推送模块错误类型
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Messaging provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Application info unavailable: {0}")]
    AppInfo(String),

    #[error("Provider returned an empty registration token")]
    EmptyToken,

    #[error("Registration was cancelled")]
    Cancelled,
}

/// 推送消息内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// 通知ID，解析失败时为0
    pub id: i32,
    /// 消息正文
    pub body: String,
    /// 自定义标题
    pub title_override: Option<String>,
    /// 声音描述
    pub sound_spec: Option<String>,
}

/// 推送事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PushEvent {
    /// 收到注册令牌
    RegistrationReceived { token: String },
    /// 收到消息
    MessageReceived(PushMessage),
}

/// 通知图标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconRef {
    /// 应用资源ID
    Resource(i32),
    /// 系统默认应用图标
    SystemDefault,
}

pub const DEFAULT_NOTIFICATION_SOUND_URI: &str = "content://settings/system/notification_sound";

/// 通知声音
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundRef {
    /// 平台默认通知音
    PlatformDefault,
    /// 应用包内的raw资源
    Resource { package: String, name: String },
}

impl SoundRef {
    pub fn uri(&self) -> String {
        match self {
            SoundRef::PlatformDefault => DEFAULT_NOTIFICATION_SOUND_URI.to_string(),
            SoundRef::Resource { package, name } => {
                format!("android.resource://{package}/raw/{name}")
            }
        }
    }
}

/// 点击通知后打开的入口
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapAction {
    pub package: String,
    pub launch_target: String,
    /// 已存在的挂起动作会被更新而不是新建
    pub update_current: bool,
}

/// 本地通知描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSpec {
    pub icon: IconRef,
    pub title: String,
    pub body: String,
    pub ticker: String,
    pub sound: Option<SoundRef>,
    pub tap_action: Option<TapAction>,
    /// 用户点击后自动消失
    pub auto_cancel: bool,
    pub when: DateTime<Utc>,
}

/// 宿主应用信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    /// 应用显示名称
    pub label: String,
    /// 应用图标资源ID
    pub icon: i32,
    /// 应用声明的整数元数据
    #[serde(default)]
    pub metadata: Option<HashMap<String, i32>>,
}

impl ApplicationInfo {
    /// 读取应用声明的整数元数据
    pub fn declared_int_metadata(&self, key: &str) -> Option<i32> {
        self.metadata.as_ref()?.get(key).copied()
    }
}

/// 注册令牌接收方（last write wins）
pub trait TokenSink: Send + Sync {
    fn set_push_registration_token(&self, token: &str);
}

/// 通知发布方，相同ID的通知会被替换
pub trait NotificationSink: Send + Sync {
    fn post(&self, id: i32, spec: NotificationSpec);
}

/// 宿主应用元数据来源
pub trait AppMetadataSource: Send + Sync {
    /// 获取包名
    fn package_name(&self) -> &str;

    /// 获取应用信息
    fn application_info(&self) -> Result<ApplicationInfo, PushError>;

    /// 获取应用启动入口
    fn launch_target(&self) -> Option<String>;
}

/// 消息服务可用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    ServiceMissing,
}

/// 消息服务提供方能力trait（用于dyn兼容）
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// 检查消息服务是否可用
    async fn availability(&self) -> Result<Availability, PushError>;

    /// 使用sender ID申请注册令牌
    async fn register(&self, sender_id: &str) -> Result<Option<String>, PushError>;

    /// 获取提供方信息
    fn provider_info(&self) -> ProviderInfo;
}

/// 提供方信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// 提供方名称
    pub name: String,
    /// 版本
    pub version: String,
    /// 注册地址
    pub endpoint: String,
}

/// 提供方工厂trait
pub trait ProviderFactory: Send + Sync {
    /// 根据JSON Value创建提供方实例
    fn create(&self, config: Value) -> Result<Box<dyn MessagingProvider>, PushError>;

    /// 获取提供方名称
    fn name(&self) -> &'static str;
}

/// 提供方注册表
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, Box<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 注册提供方工厂
    pub fn register(&mut self, factory: Box<dyn ProviderFactory>) {
        self.factories.insert(factory.name().to_string(), factory);
    }

    /// 获取提供方工厂
    pub fn get_factory(&self, name: &str) -> Option<&dyn ProviderFactory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    /// 按名称和配置创建提供方
    pub fn create(&self, name: &str, config: Value) -> Result<Box<dyn MessagingProvider>, PushError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| PushError::Config(format!("Provider '{}' not found", name)))?;
        factory.create(config)
    }

    /// 获取所有支持的提供方名称
    pub fn list_providers(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

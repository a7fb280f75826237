use common::NotificationSpec;
use lqd_push::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 推送事件请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    /// 事件动作字符串
    pub action: String,
    /// 扁平字段表
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

/// 推送事件响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    /// 是否为本SDK的推送
    pub is_push: bool,
    /// 执行的动作
    pub action: Action,
}

/// 设备注册请求体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// 为空时使用配置中的sender ID
    pub sender_id: Option<String>,
}

/// 设备注册响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub accepted: bool,
    pub sender_id: String,
}

/// 当前注册令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

/// 已发布的通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedNotification {
    pub id: i32,
    pub spec: NotificationSpec,
}

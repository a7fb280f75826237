use crate::presenter::NotificationPresenter;
use common::{NotificationSpec, PushEvent, PushMessage, TokenSink};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const REGISTRATION_ACTION: &str = "com.google.android.c2dm.intent.REGISTRATION";
pub const MESSAGE_ACTION: &str = "com.google.android.c2dm.intent.RECEIVE";

pub const REGISTRATION_ID_FIELD: &str = "registration_id";
pub const MESSAGE_FIELD: &str = "lqd_message";
pub const PUSH_ID_FIELD: &str = "lqd_id";
pub const SOUND_FIELD: &str = "lqd_sound";
pub const TITLE_FIELD: &str = "lqd_title";

/// 消息服务投递的扁平字段表
pub type Payload = HashMap<String, String>;

/// 事件类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Registration,
    Message,
    Other(String),
}

impl EventKind {
    pub fn from_action(action: &str) -> Self {
        match action {
            REGISTRATION_ACTION => EventKind::Registration,
            MESSAGE_ACTION => EventKind::Message,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// 处理事件后应执行的动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Action {
    /// 将注册令牌转交给SDK
    ForwardToken(String),
    /// 展示本地通知
    ShowNotification { id: i32, spec: NotificationSpec },
    /// 忽略
    Ignore,
}

/// 负载是否属于本SDK的推送消息
pub fn is_push_event(payload: &Payload) -> bool {
    payload.contains_key(MESSAGE_FIELD)
}

/// 读取推送ID，缺失或无法解析时为0
pub fn push_id(payload: &Payload) -> i32 {
    payload
        .get(PUSH_ID_FIELD)
        .and_then(|id| id.parse().ok())
        .unwrap_or(0)
}

/// 将事件类型和负载解析为推送事件
pub fn parse_event(kind: &EventKind, payload: &Payload) -> Option<PushEvent> {
    match kind {
        EventKind::Registration => payload
            .get(REGISTRATION_ID_FIELD)
            .filter(|token| !token.is_empty())
            .map(|token| PushEvent::RegistrationReceived {
                token: token.clone(),
            }),
        EventKind::Message => Some(PushEvent::MessageReceived(PushMessage {
            id: push_id(payload),
            body: payload.get(MESSAGE_FIELD).cloned().unwrap_or_default(),
            title_override: payload.get(TITLE_FIELD).cloned(),
            sound_spec: payload.get(SOUND_FIELD).cloned(),
        })),
        EventKind::Other(_) => None,
    }
}

/// 推送接收器
pub struct PushReceiver {
    tokens: Arc<dyn TokenSink>,
    presenter: NotificationPresenter,
}

impl PushReceiver {
    pub fn new(tokens: Arc<dyn TokenSink>, presenter: NotificationPresenter) -> Self {
        Self { tokens, presenter }
    }

    /// 解释事件，不产生副作用
    pub fn handle(&self, action: &str, payload: &Payload) -> Action {
        let kind = EventKind::from_action(action);
        match parse_event(&kind, payload) {
            Some(PushEvent::RegistrationReceived { token }) => Action::ForwardToken(token),
            Some(PushEvent::MessageReceived(message)) => Action::ShowNotification {
                id: message.id,
                spec: self.presenter.build(&message),
            },
            None => {
                debug!("Ignoring event {:?}", kind);
                Action::Ignore
            }
        }
    }

    /// 处理事件并执行对应动作
    pub fn on_event(&self, action: &str, payload: &Payload) -> Action {
        let action = self.handle(action, payload);
        self.apply(&action);
        action
    }

    fn apply(&self, action: &Action) {
        match action {
            Action::ForwardToken(token) => {
                info!("Push registration id received: {}", token);
                self.tokens.set_push_registration_token(token);
            }
            Action::ShowNotification { id, spec } => self.presenter.post(*id, spec.clone()),
            Action::Ignore => {}
        }
    }
}

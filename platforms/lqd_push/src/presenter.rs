use chrono::Utc;
use common::{
    AppMetadataSource, IconRef, NotificationSink, NotificationSpec, PushMessage, SoundRef,
    TapAction,
};
use log::*;
use std::sync::Arc;

/// 应用自定义通知图标的元数据键
pub const NOTIFICATION_ICON_METADATA: &str = "io.lqd.sdk.notification_icon";
/// 使用平台默认声音的声音描述
pub const DEFAULT_SOUND_SPEC: &str = "default";

/// 通知展示器：解析图标、标题、声音和点击入口，然后发布本地通知
pub struct NotificationPresenter {
    app: Arc<dyn AppMetadataSource>,
    notifications: Arc<dyn NotificationSink>,
}

impl NotificationPresenter {
    pub fn new(app: Arc<dyn AppMetadataSource>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self { app, notifications }
    }

    /// 构建通知描述，不产生副作用
    pub fn build(&self, message: &PushMessage) -> NotificationSpec {
        let app = self.app.as_ref();
        NotificationSpec {
            icon: resolve_icon(app),
            title: resolve_title(message.title_override.as_deref(), app),
            body: message.body.clone(),
            ticker: message.body.clone(),
            sound: resolve_sound(message.sound_spec.as_deref(), app.package_name()),
            tap_action: resolve_tap_action(app),
            auto_cancel: true,
            when: Utc::now(),
        }
    }

    /// 构建并发布通知，以消息ID作为去重键
    pub fn present(&self, message: &PushMessage) {
        let spec = self.build(message);
        self.post(message.id, spec);
    }

    pub(crate) fn post(&self, id: i32, spec: NotificationSpec) {
        debug!("Posting notification {}: {}", id, spec.title);
        self.notifications.post(id, spec);
    }
}

/// 解析通知图标
pub fn resolve_icon(app: &dyn AppMetadataSource) -> IconRef {
    match app.application_info() {
        Ok(info) => match info.declared_int_metadata(NOTIFICATION_ICON_METADATA) {
            Some(icon) if icon > 0 => IconRef::Resource(icon),
            _ => IconRef::Resource(info.icon),
        },
        Err(e) => {
            debug!("Falling back to system icon: {}", e);
            IconRef::SystemDefault
        }
    }
}

/// 解析通知标题
pub fn resolve_title(title_override: Option<&str>, app: &dyn AppMetadataSource) -> String {
    match title_override {
        Some(title) => title.to_string(),
        None => app
            .application_info()
            .map(|info| info.label)
            .unwrap_or_default(),
    }
}

/// 解析通知声音
pub fn resolve_sound(sound_spec: Option<&str>, package: &str) -> Option<SoundRef> {
    match sound_spec? {
        DEFAULT_SOUND_SPEC => Some(SoundRef::PlatformDefault),
        name => Some(SoundRef::Resource {
            package: package.to_string(),
            name: name.to_string(),
        }),
    }
}

/// 解析点击入口，应用没有启动入口时为None
pub fn resolve_tap_action(app: &dyn AppMetadataSource) -> Option<TapAction> {
    app.launch_target().map(|launch_target| TapAction {
        package: app.package_name().to_string(),
        launch_target,
        update_current: true,
    })
}

use crate::config::AppSection;
use common::{
    AppMetadataSource, ApplicationInfo, NotificationSink, NotificationSpec, PushError, TokenSink,
};
use log::*;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError, RwLock};

/// 内存中的注册令牌，后写入者生效
#[derive(Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn current(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenSink for TokenStore {
    fn set_push_registration_token(&self, token: &str) {
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(token.to_string());
    }
}

/// 内存中的通知列表，按ID去重
#[derive(Default)]
pub struct NotificationBoard {
    posted: Mutex<BTreeMap<i32, NotificationSpec>>,
}

impl NotificationBoard {
    pub fn snapshot(&self) -> Vec<(i32, NotificationSpec)> {
        let posted = self.posted.lock().unwrap_or_else(PoisonError::into_inner);
        posted.iter().map(|(id, spec)| (*id, spec.clone())).collect()
    }
}

impl NotificationSink for NotificationBoard {
    fn post(&self, id: i32, spec: NotificationSpec) {
        info!("Notification {} [{}]: {}", id, spec.title, spec.body);
        self.posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, spec);
    }
}

/// 由配置提供的宿主应用信息
pub struct ConfiguredApp {
    section: AppSection,
}

impl ConfiguredApp {
    pub fn new(section: AppSection) -> Self {
        Self { section }
    }
}

impl AppMetadataSource for ConfiguredApp {
    fn package_name(&self) -> &str {
        &self.section.package_name
    }

    fn application_info(&self) -> Result<ApplicationInfo, PushError> {
        self.section
            .info
            .clone()
            .ok_or_else(|| PushError::AppInfo(self.section.package_name.clone()))
    }

    fn launch_target(&self) -> Option<String> {
        self.section.launch_target.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::IconRef;
    use std::sync::Arc;

    fn spec(body: &str) -> NotificationSpec {
        NotificationSpec {
            icon: IconRef::SystemDefault,
            title: "t".to_string(),
            body: body.to_string(),
            ticker: body.to_string(),
            sound: None,
            tap_action: None,
            auto_cancel: true,
            when: Utc::now(),
        }
    }

    #[test]
    fn test_token_store_last_write_wins() {
        let store = TokenStore::default();
        assert!(store.current().is_none());
        store.set_push_registration_token("a");
        store.set_push_registration_token("b");
        assert_eq!(store.current().as_deref(), Some("b"));
    }

    #[test]
    fn test_notification_board_replaces_by_id() {
        let board = NotificationBoard::default();
        board.post(1, spec("first"));
        board.post(1, spec("second"));
        let posted = board.snapshot();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].1.body, "second");
    }

    #[test]
    fn test_poisoned_locks_keep_working() {
        let store = Arc::new(TokenStore::default());
        let board = Arc::new(NotificationBoard::default());
        store.set_push_registration_token("before");
        board.post(1, spec("before"));

        let (s, b) = (store.clone(), board.clone());
        let _ = std::thread::spawn(move || {
            let _token = s.token.write().unwrap();
            let _posted = b.posted.lock().unwrap();
            panic!("poison both locks");
        })
        .join();
        assert!(store.token.is_poisoned());
        assert!(board.posted.is_poisoned());

        store.set_push_registration_token("after");
        assert_eq!(store.current().as_deref(), Some("after"));

        board.post(1, spec("after"));
        board.post(2, spec("other"));
        let posted = board.snapshot();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0].1.body, "after");
    }

    #[test]
    fn test_configured_app_without_info() {
        let app = ConfiguredApp::new(AppSection {
            package_name: "com.example.app".to_string(),
            launch_target: None,
            info: None,
        });
        assert!(matches!(app.application_info(), Err(PushError::AppInfo(_))));
        assert!(app.launch_target().is_none());
    }
}

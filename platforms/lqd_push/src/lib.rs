//! Push messaging receiver for the Liquid collect SDK.

pub mod presenter;
pub mod provider;
pub mod receiver;
pub mod registration;

pub use presenter::NotificationPresenter;
pub use provider::{GcmConfig, GcmProvider, GcmProviderFactory};
pub use receiver::{Action, EventKind, Payload, PushReceiver, is_push_event, parse_event, push_id};
pub use registration::{Registration, register_device, register_device_with};

use log::*;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const BASE_URL: &str = "https://api.lqd.io/collect/";
const PLATFORM: &str = "android";

/// 路径段中保留不编码的字符
const USER_ID_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'!')
    .remove(b'.')
    .remove(b'~')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*');

/// HTTP方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// 待执行的请求描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    url: String,
    method: HttpMethod,
    body: Option<String>,
}

impl RequestDescriptor {
    fn new(url: String, method: HttpMethod, body: Option<String>) -> Self {
        Self { url, method, body }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

fn encode_user_id(user_id: &str) -> String {
    utf8_percent_encode(user_id, USER_ID_ENCODE_SET).to_string()
}

fn json_body(payload: &Map<String, Value>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|e| {
        error!("Failed to serialize request body: {}", e);
        "{}".to_string()
    })
}

/// 用户别名请求
pub fn create_alias_request(old_id: &str, new_id: &str) -> Option<RequestDescriptor> {
    let mut payload = Map::new();
    payload.insert("unique_id".to_string(), Value::from(new_id));
    payload.insert("unique_id_alias".to_string(), Value::from(old_id));
    match serde_json::to_string(&payload) {
        Ok(body) => Some(RequestDescriptor::new(
            format!("{BASE_URL}aliases"),
            HttpMethod::Post,
            Some(body),
        )),
        Err(e) => {
            error!("Failed to build alias request: {}", e);
            None
        }
    }
}

/// 数据点上报请求，body原样发送
pub fn create_data_point_request(data_point: impl Into<String>) -> RequestDescriptor {
    RequestDescriptor::new(
        format!("{BASE_URL}data_points"),
        HttpMethod::Post,
        Some(data_point.into()),
    )
}

/// 拉取Liquid包请求
pub fn request_liquid_package_request(user_id: &str, device_id: &str) -> RequestDescriptor {
    RequestDescriptor::new(
        format!(
            "{BASE_URL}users/{}/devices/{}/liquid_package",
            encode_user_id(user_id),
            device_id
        ),
        HttpMethod::Get,
        None,
    )
}

/// 变量同步请求
pub fn create_variable_request(variable: &Value) -> RequestDescriptor {
    RequestDescriptor::new(
        format!("{BASE_URL}variables"),
        HttpMethod::Post,
        Some(variable.to_string()),
    )
}

/// 拉取应用内消息请求
pub fn inapp_messages_request(user_id: &str) -> RequestDescriptor {
    RequestDescriptor::new(
        format!("{BASE_URL}users/{}/inapp_messages", encode_user_id(user_id)),
        HttpMethod::Get,
        None,
    )
}

/// 应用内消息上报请求
pub fn inapp_messages_report_request(
    user_id: &str,
    formula_id: &str,
    payload: Option<&Value>,
) -> RequestDescriptor {
    RequestDescriptor::new(
        format!(
            "{BASE_URL}formulas/{}/users/{}/report",
            formula_id,
            encode_user_id(user_id)
        ),
        HttpMethod::Post,
        payload.map(Value::to_string),
    )
}

/// 拉取需跟踪的UI元素请求
pub fn ui_elements_to_track_request(token: Option<&str>) -> RequestDescriptor {
    let url = match token {
        Some(token) => format!("{BASE_URL}ui_elements/?platform={PLATFORM}&token={token}"),
        None => format!("{BASE_URL}ui_elements/?platform={PLATFORM}"),
    };
    RequestDescriptor::new(url, HttpMethod::Get, None)
}

/// 新增跟踪UI元素请求
pub fn ui_elements_add(identifier: &str, event_name: &str) -> RequestDescriptor {
    let mut payload = Map::new();
    payload.insert("identifier".to_string(), Value::from(identifier));
    payload.insert("event_name".to_string(), Value::from(event_name));
    payload.insert("platform".to_string(), Value::from(PLATFORM));
    RequestDescriptor::new(
        format!("{BASE_URL}ui_elements/add"),
        HttpMethod::Post,
        Some(json_body(&payload)),
    )
}

/// 移除跟踪UI元素请求
pub fn ui_elements_remove(identifier: &str) -> RequestDescriptor {
    let mut payload = Map::new();
    payload.insert("identifier".to_string(), Value::from(identifier));
    payload.insert("platform".to_string(), Value::from(PLATFORM));
    RequestDescriptor::new(
        format!("{BASE_URL}ui_elements/remove"),
        HttpMethod::Post,
        Some(json_body(&payload)),
    )
}

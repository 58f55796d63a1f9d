//! 入站推送消息

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 数据字段中声明消息类型的 key
pub const TYPE_ATTRIBUTE: &str = "type";

/// 入站推送消息，接收后不可变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// 声明的类型字符串（可能缺失）
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// 所有 payload 字段
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl InboundMessage {
    pub fn new(category: Option<&str>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            category: category.map(str::to_string),
            title: Some(title.into()),
            body: Some(body.into()),
            attributes: HashMap::new(),
        }
    }

    /// 从推送的通知部分和数据部分构造，类型取自数据字段 `type`
    pub fn from_payload(
        title: Option<String>,
        body: Option<String>,
        attributes: HashMap<String, String>,
    ) -> Self {
        Self {
            category: attributes.get(TYPE_ATTRIBUTE).cloned(),
            title,
            body,
            attributes,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 标题和正文都缺失时无内容可展示
    pub fn is_displayable(&self) -> bool {
        self.title.is_some() || self.body.is_some()
    }
}

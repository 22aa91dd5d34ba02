//! 空角色: 服务端报告了一个已识别但不支持的角色

use bifrost::Message;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullRole {
    reported_name: String,
}

impl NullRole {
    pub fn new(reported_name: impl Into<String>) -> Self {
        Self {
            reported_name: reported_name.into(),
        }
    }

    pub fn reported_name(&self) -> &str {
        &self.reported_name
    }

    pub fn handle_message(&self, msg: &Message) {
        debug!("Null role ({}) ignoring {}", self.reported_name, msg.word());
    }
}

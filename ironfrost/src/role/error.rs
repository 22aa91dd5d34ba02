//! 错误角色
//!
//! 不可变的终止角色，说明这个连接为什么不能用。

use bifrost::Message;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 错误种类
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRoleKind {
    /// 服务端分配了无法识别的角色
    UnknownRole,
    /// 无法建立连接
    CannotConnect,
}

/// 错误角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRole {
    kind: ErrorRoleKind,
    details: Vec<String>,
}

impl ErrorRole {
    pub fn new<I, S>(kind: ErrorRoleKind, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            details: details.into_iter().map(Into::into).collect(),
        }
    }

    /// 服务端分配了未知角色
    pub fn unknown_role(name: impl Into<String>) -> Self {
        Self::new(ErrorRoleKind::UnknownRole, [name.into()])
    }

    /// 连接失败
    pub fn cannot_connect(reason: impl Into<String>) -> Self {
        Self::new(ErrorRoleKind::CannotConnect, [reason.into()])
    }

    pub fn kind(&self) -> ErrorRoleKind {
        self.kind
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// 给人看的错误说明
    pub fn message(&self) -> String {
        let detail = self.details.first().map(String::as_str).unwrap_or_default();
        match self.kind {
            ErrorRoleKind::UnknownRole => format!("Bifrost server returned unknown role: {}", detail),
            ErrorRoleKind::CannotConnect => {
                format!("Could not connect to the Bifrost server: {}", detail)
            }
        }
    }

    /// 没有可以恢复的动作，所有消息都被吞掉
    pub fn handle_message(&self, msg: &Message) {
        debug!("Error role swallowing {}", msg.word());
    }
}

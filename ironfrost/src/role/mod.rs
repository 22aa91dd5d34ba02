//! 客户端角色状态机
//!
//! ```text
//! Initial --IAMA(player/file)--> Player
//! Initial --IAMA(其他)---------> Error(UnknownRole)
//! ```
//! Player、Error、Null 都是终止角色。连接失败产生的 Error(CannotConnect)
//! 在建立连接时构造，不经过消息路径。

mod error;
mod initial;
mod null;
mod player;

pub use error::{ErrorRole, ErrorRoleKind};
pub use initial::{Handshake, InitialRole};
pub use null::NullRole;
pub use player::{PlayState, PlayerRequest, PlayerRole};

use bifrost::{Message, ROLE_ERROR_NAME, ROLE_PLAYER_FILE};

use crate::event::{ClientEvent, Effects};

/// 连接当前的角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Initial(InitialRole),
    Player(PlayerRole),
    Error(ErrorRole),
    Null(NullRole),
}

impl Role {
    /// 每个连接的第一个角色
    pub fn initial() -> Self {
        Role::Initial(InitialRole::new())
    }

    /// 根据 IAMA 报告的角色名构造角色
    pub fn from_name(name: &str) -> Self {
        match name {
            ROLE_PLAYER_FILE => Role::Player(PlayerRole::new()),
            other => Role::Error(ErrorRole::unknown_role(other)),
        }
    }

    /// 角色名
    pub fn name(&self) -> &str {
        match self {
            Role::Initial(_) => "",
            Role::Player(_) => ROLE_PLAYER_FILE,
            Role::Error(_) => ROLE_ERROR_NAME,
            Role::Null(role) => role.reported_name(),
        }
    }

    /// 处理一条入站消息
    ///
    /// 消息先转发给订阅者，再由当前角色解释。返回 `Some` 表示请求切换角色。
    pub fn handle_message(&mut self, msg: &Message, fx: &mut Effects) -> Option<Role> {
        fx.notify(ClientEvent::MessageReceived(msg.clone()));
        match self {
            Role::Initial(role) => role.handle_message(msg, fx),
            Role::Player(role) => {
                role.handle_message(msg, fx);
                None
            }
            Role::Error(role) => {
                role.handle_message(msg);
                None
            }
            Role::Null(role) => {
                role.handle_message(msg);
                None
            }
        }
    }

    pub fn as_initial(&self) -> Option<&InitialRole> {
        match self {
            Role::Initial(role) => Some(role),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerRole> {
        match self {
            Role::Player(role) => Some(role),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorRole> {
        match self {
            Role::Error(role) => Some(role),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::initial()
    }
}

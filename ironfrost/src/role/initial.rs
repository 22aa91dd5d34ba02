//! 初始角色
//!
//! 连接建立后的第一个角色: 记录握手，等待服务端分配角色。

use bifrost::{Message, VERB_IAMA, VERB_OHAI};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Role;
use crate::event::{ClientEvent, Effects, Problem};

/// OHAI 握手内容
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub client_id: String,
    pub protocol_id: String,
    pub server_id: String,
}

/// 初始角色
///
/// 总是通过 IAMA 切换离开，自身不会终止。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitialRole {
    handshake: Option<Handshake>,
}

impl InitialRole {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已观察到的握手
    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    /// 处理消息，收到合法的 IAMA 时返回新角色
    pub fn handle_message(&mut self, msg: &Message, fx: &mut Effects) -> Option<Role> {
        match msg.word() {
            VERB_OHAI => {
                self.handle_ohai(msg, fx);
                None
            }
            VERB_IAMA => self.handle_iama(msg, fx),
            other => {
                debug!("Initial role ignoring {}", other);
                None
            }
        }
    }

    fn handle_ohai(&mut self, msg: &Message, fx: &mut Effects) {
        if let Err(e) = msg.expect_args(3) {
            warn!("Ignoring malformed handshake: {}", e);
            fx.problem(Problem::malformed(&e));
            return;
        }

        let handshake = Handshake {
            client_id: msg.args()[0].clone(),
            protocol_id: msg.args()[1].clone(),
            server_id: msg.args()[2].clone(),
        };

        // 不覆盖已有的握手
        if self.handshake.is_some() {
            warn!("Ignoring repeated handshake: {:?}", handshake);
            fx.problem(Problem::RepeatedHandshake { ignored: handshake });
            return;
        }

        info!(
            "Handshake: client={} protocol={} server={}",
            handshake.client_id, handshake.protocol_id, handshake.server_id
        );
        self.handshake = Some(handshake.clone());
        fx.notify(ClientEvent::Handshake(handshake));
    }

    fn handle_iama(&mut self, msg: &Message, fx: &mut Effects) -> Option<Role> {
        if let Err(e) = msg.expect_args(1) {
            warn!("Ignoring malformed role assignment: {}", e);
            fx.problem(Problem::malformed(&e));
            return None;
        }
        Some(Role::from_name(&msg.args()[0]))
    }
}

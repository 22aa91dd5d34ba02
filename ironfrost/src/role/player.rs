//! 文件播放器角色 (`player/file`)
//!
//! 跟踪已加载文件、播放位置和播放状态，并构造发往服务端的请求。

use bifrost::{
    fresh_tag, Message, ProtocolError, REQ_EJECT, REQ_END, REQ_FLOAD, REQ_PLAY, REQ_POS,
    REQ_STOP, VERB_EJECT, VERB_END, VERB_FLOAD, VERB_PLAY, VERB_POS, VERB_STOP,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{ClientEvent, Effects, PlayerField, Problem};

/// 播放状态
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    Ejected,
    Stopped,
    Playing,
    /// 收到第一条相关消息之前
    #[default]
    Unknown,
}

/// UI 发起的播放器请求
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PlayerRequest {
    /// 加载文件
    Fload(String),
    Play,
    Stop,
    Eject,
    End,
    /// 定位（微秒）
    Pos(u64),
}

/// 文件播放器角色
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRole {
    loaded_file: Option<String>,
    /// 播放位置（微秒）
    position: u64,
    state: PlayState,
}

impl PlayerRole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded_file(&self) -> Option<&str> {
        self.loaded_file.as_deref()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// 处理服务端消息
    ///
    /// 只在字段真正变化时发出通知。
    pub fn handle_message(&mut self, msg: &Message, fx: &mut Effects) {
        if let Err(e) = self.apply(msg, fx) {
            warn!("Dropping {} message: {}", msg.word(), e);
            fx.problem(Problem::malformed(&e));
        }
    }

    fn apply(&mut self, msg: &Message, fx: &mut Effects) -> Result<(), ProtocolError> {
        match msg.word() {
            VERB_FLOAD => {
                msg.expect_args(1)?;
                self.update_loaded_file(Some(msg.args()[0].clone()), fx);
                // 从弹出状态加载文件，意味着停在开头；不必等服务端确认
                if self.state == PlayState::Ejected {
                    self.update_state(PlayState::Stopped, fx);
                    self.update_position(0, fx);
                }
            }
            VERB_PLAY => self.update_state(PlayState::Playing, fx),
            VERB_STOP => self.update_state(PlayState::Stopped, fx),
            VERB_END => {
                self.update_state(PlayState::Stopped, fx);
                self.update_position(0, fx);
            }
            VERB_EJECT => {
                self.update_state(PlayState::Ejected, fx);
                self.update_loaded_file(None, fx);
                self.update_position(0, fx);
            }
            VERB_POS => {
                msg.expect_args(1)?;
                let arg = &msg.args()[0];
                let position = arg.parse::<u64>().map_err(|e| ProtocolError::MalformedArgument {
                    word: msg.word().to_string(),
                    arg: arg.clone(),
                    reason: e.to_string(),
                })?;
                self.update_position(position, fx);
            }
            other => debug!("Player ignoring {}", other),
        }
        Ok(())
    }

    fn update_loaded_file(&mut self, file: Option<String>, fx: &mut Effects) {
        if self.loaded_file != file {
            self.loaded_file = file.clone();
            fx.notify(ClientEvent::PlayerChanged(PlayerField::LoadedFile(file)));
        }
    }

    fn update_position(&mut self, position: u64, fx: &mut Effects) {
        if self.position != position {
            self.position = position;
            fx.notify(ClientEvent::PlayerChanged(PlayerField::Position(position)));
        }
    }

    fn update_state(&mut self, state: PlayState, fx: &mut Effects) {
        if self.state != state {
            self.state = state;
            fx.notify(ClientEvent::PlayerChanged(PlayerField::State(state)));
        }
    }

    // ========================================================================
    // 出站请求
    // ========================================================================

    /// 执行一个 UI 请求
    pub fn request(&self, request: &PlayerRequest, fx: &mut Effects) {
        match request {
            PlayerRequest::Fload(path) => self.request_fload(path, fx),
            PlayerRequest::Play => self.request_play(fx),
            PlayerRequest::Stop => self.request_stop(fx),
            PlayerRequest::Eject => self.request_eject(fx),
            PlayerRequest::End => self.request_end(fx),
            PlayerRequest::Pos(micros) => self.request_pos(*micros, fx),
        }
    }

    pub fn request_fload(&self, path: &str, fx: &mut Effects) {
        fx.send(Message::new(fresh_tag(), REQ_FLOAD, [path]));
    }

    pub fn request_play(&self, fx: &mut Effects) {
        fx.send(bare_request(REQ_PLAY));
    }

    pub fn request_stop(&self, fx: &mut Effects) {
        fx.send(bare_request(REQ_STOP));
    }

    pub fn request_eject(&self, fx: &mut Effects) {
        fx.send(bare_request(REQ_EJECT));
    }

    pub fn request_end(&self, fx: &mut Effects) {
        fx.send(bare_request(REQ_END));
    }

    pub fn request_pos(&self, micros: u64, fx: &mut Effects) {
        fx.send(Message::new(fresh_tag(), REQ_POS, [micros.to_string()]));
    }

    // ========================================================================
    // 命令可用性（供 UI 启用/禁用按钮）
    // ========================================================================

    pub fn can_fload(&self) -> bool {
        true
    }

    pub fn can_play(&self) -> bool {
        self.state == PlayState::Stopped
    }

    pub fn can_stop(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn can_eject(&self) -> bool {
        self.state != PlayState::Ejected
    }

    pub fn can_end(&self) -> bool {
        self.state != PlayState::Ejected
    }
}

fn bare_request(verb: &str) -> Message {
    Message::new(fresh_tag(), verb, Vec::<String>::new())
}

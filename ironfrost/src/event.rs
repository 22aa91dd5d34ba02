//! 客户端事件
//!
//! 运行循环把角色产生的通知按顺序转发给订阅者（通常是 UI）。

use bifrost::{Message, ProtocolError};

use crate::role::{Handshake, PlayState, PlayerRequest, Role};

/// 网络循环发给订阅者的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// 收到一条消息（在角色解释它之前）
    MessageReceived(Message),
    /// 观察到握手
    Handshake(Handshake),
    /// 播放器的某个字段发生了变化
    PlayerChanged(PlayerField),
    /// 当前角色被替换，携带新角色的快照
    RoleChanged(Role),
    /// 可恢复的问题，对应的单元已被丢弃
    Problem(Problem),
    /// 一条消息已写入通道
    Sent(Message),
    /// 通道已关闭或循环已停止
    Disconnected { reason: String },
}

/// 播放器字段变化，携带新值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerField {
    LoadedFile(Option<String>),
    /// 播放位置（微秒）
    Position(u64),
    State(PlayState),
}

/// 可恢复的问题
#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    /// 无法解析的行、参数个数错误或参数格式错误
    Malformed { reason: String },
    /// 同一个初始角色收到第二次握手，已忽略
    RepeatedHandshake { ignored: Handshake },
    /// 当前角色不支持该请求
    RequestRejected { request: PlayerRequest, role: String },
}

impl Problem {
    /// 从单条消息级别的协议错误构造
    pub fn malformed(err: &ProtocolError) -> Self {
        Problem::Malformed {
            reason: err.to_string(),
        }
    }
}

/// 角色处理一次输入时产生的副作用，按发生顺序记录
#[derive(Debug, Default)]
pub struct Effects {
    events: Vec<ClientEvent>,
    outgoing: Vec<Message>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条通知
    pub fn notify(&mut self, event: ClientEvent) {
        self.events.push(event);
    }

    /// 记录一个可恢复的问题
    pub fn problem(&mut self, problem: Problem) {
        self.events.push(ClientEvent::Problem(problem));
    }

    /// 记录一条要发出的消息
    pub fn send(&mut self, msg: Message) {
        self.outgoing.push(msg);
    }

    pub fn events(&self) -> &[ClientEvent] {
        &self.events
    }

    pub fn outgoing(&self) -> &[Message] {
        &self.outgoing
    }

    pub fn into_parts(self) -> (Vec<ClientEvent>, Vec<Message>) {
        (self.events, self.outgoing)
    }
}

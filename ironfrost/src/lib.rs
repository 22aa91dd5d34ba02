//! Ironfrost: Bifrost 协议客户端
//!
//! 包含:
//! - 角色状态机 (Role: Initial / Player / Error / Null)
//! - 客户端事件 (ClientEvent)
//! - 连接编排 (Client, ClientHandle)
//! - 控制台命令解析

mod client;
mod console;
mod error;
mod event;
pub mod role;

pub use client::{control, Client, ClientControl, ClientHandle, DynReader, DynWriter};
pub use console::{parse_command, ConsoleCommand};
pub use error::{ClientError, Result};
pub use event::{ClientEvent, Effects, PlayerField, Problem};
pub use role::{PlayState, PlayerRequest, Role};

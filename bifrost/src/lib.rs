//! Bifrost 协议库
//!
//! 包含:
//! - 增量分词器 (Tokenizer)
//! - 行打包 (pack)
//! - 消息类型 (Message)
//! - 传输层抽象 (Transport trait)
//! - 行编解码 (LineReader, LineWriter)
//! - 连接封装 (Connection)

mod tokenizer;
mod packer;
mod message;
mod constants;
mod transport;
mod codec;
mod connection;
mod error;

pub use tokenizer::{is_separator, Line, Tokenizer};
pub use packer::{needs_quoting, pack, pack_into};
pub use message::{fresh_tag, Message};
pub use constants::*;
pub use transport::{Transport, TransportConfig, TcpTransport};
pub use codec::{LineReader, LineWriter};
pub use connection::Connection;
pub use error::{ProtocolError, Result};

//! 连接封装
//!
//! 把连接标识和一对行读写端绑在一起，交给客户端后再拆开使用。

use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{LineReader, LineWriter};
use crate::transport::Transport;

/// 连接封装
///
/// # Type Parameters
/// * `R` - 读取端类型
/// * `W` - 写入端类型
pub struct Connection<R, W> {
    name: String,
    reader: LineReader<R>,
    writer: LineWriter<W>,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Connection<R, W> {
    /// 从传输层创建连接
    pub fn new<T: Transport<Reader = R, Writer = W>>(transport: T) -> Self {
        let name = transport.peer_name().to_string();
        let (reader, writer) = transport.split();
        Self::from_parts(name, reader, writer)
    }

    /// 从读写端直接创建连接
    pub fn from_parts(name: impl Into<String>, reader: R, writer: W) -> Self {
        Self {
            name: name.into(),
            reader: LineReader::new(reader),
            writer: LineWriter::new(writer),
        }
    }

    /// 连接标识
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 分离为连接名、读取端和写入端
    pub fn split(self) -> (String, LineReader<R>, LineWriter<W>) {
        (self.name, self.reader, self.writer)
    }
}

//! 行编解码
//!
//! 线上格式:
//! ```text
//! <tag> <word> [<arg> ...]\n
//! ```
//! 读取端把原始字节块交给连接独占的 [`Tokenizer`]，写入端用打包器编码。

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::message::Message;
use crate::packer;
use crate::tokenizer::{Line, Tokenizer};
use crate::{READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};

/// 行读取器
pub struct LineReader<R> {
    reader: R,
    buffer: Vec<u8>,
    tokenizer: Tokenizer,
    /// `read_line` 多读出来的行
    pending: VecDeque<Line>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// 创建新的行读取器
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            tokenizer: Tokenizer::new(),
            pending: VecDeque::new(),
        }
    }

    /// 读取一块字节并返回其中完成的行
    ///
    /// 返回 `None` 表示对端已关闭。唯一的等待点是底层读取，
    /// 所以可以安全地放进 `tokio::select!`。
    pub async fn read_chunk(&mut self) -> Result<Option<Vec<Line>>> {
        let n = self.reader.read(&mut self.buffer).await?;
        if n == 0 {
            if !self.tokenizer.is_idle() {
                warn!("Stream ended inside an unterminated line; discarding it");
            }
            return Ok(None);
        }
        let lines = self.tokenizer.feed(&self.buffer[..n]);
        debug!("Read {} bytes, {} complete line(s)", n, lines.len());
        Ok(Some(lines))
    }

    /// 读取下一整行
    pub async fn read_line(&mut self) -> Result<Line> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(line);
            }
            match self.read_chunk().await? {
                Some(lines) => self.pending.extend(lines),
                None => return Err(ProtocolError::ConnectionClosed),
            }
        }
    }

    /// 接收下一条消息
    pub async fn recv(&mut self) -> Result<Message> {
        let line = self.read_line().await?;
        Message::from_line(line)
    }
}

/// 行写入器
pub struct LineWriter<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// 创建新的行写入器
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(WRITE_BUFFER_SIZE),
        }
    }

    /// 打包并写入一行
    pub async fn write_line<S: AsRef<str>>(&mut self, words: &[S]) -> Result<()> {
        self.buffer.clear();
        packer::pack_into(&mut self.buffer, words);

        self.writer.write_all(&self.buffer).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// 发送消息
    pub async fn send(&mut self, msg: &Message) -> Result<()> {
        let words: Vec<&str> = msg.words().collect();
        self.write_line(words.as_slice()).await
    }
}

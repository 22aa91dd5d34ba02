//! 错误类型定义

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 行中的单词不足以构成消息（至少需要 tag 和 word）
    #[error("Malformed message: expected at least 2 words, got {words}")]
    MalformedMessage { words: usize },

    /// 参数个数不符合该动词的要求
    #[error("{word} expects {expected} argument(s), got {actual}")]
    BadArity {
        word: String,
        expected: usize,
        actual: usize,
    },

    /// 参数无法解析
    #[error("Malformed argument to {word}: {arg:?} ({reason})")]
    MalformedArgument {
        word: String,
        arg: String,
        reason: String,
    },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

impl ProtocolError {
    /// 是否为单条消息级别的可恢复错误
    ///
    /// 可恢复错误只影响当前这一行，读循环应当继续。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::MalformedMessage { .. }
                | ProtocolError::BadArity { .. }
                | ProtocolError::MalformedArgument { .. }
        )
    }
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;

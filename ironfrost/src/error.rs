//! 客户端错误类型

use bifrost::ProtocolError;
use thiserror::Error;

/// 客户端错误类型
///
/// 单条消息级别的问题不会出现在这里，它们以事件形式报告。
#[derive(Error, Debug)]
pub enum ClientError {
    /// 通道读写失败，运行循环已结束
    #[error("Channel error: {0}")]
    Channel(#[from] ProtocolError),

    /// 运行循环已经停止，无法接收请求
    #[error("Client is not running")]
    NotRunning,
}

/// 客户端操作结果类型
pub type Result<T> = std::result::Result<T, ClientError>;

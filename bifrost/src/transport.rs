//! 传输层抽象
//!
//! 核心只负责分帧与转义，原始字节的读写交给传输层。
//! 通过 Transport trait 与具体传输实现解耦。

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::CONNECT_TIMEOUT;

/// 传输层配置
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// 连接超时时间
    pub connect_timeout: Duration,
    /// 是否禁用 Nagle 算法（TCP nodelay）
    pub nodelay: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            nodelay: true, // 每条命令都很短，减少延迟
        }
    }
}

/// 传输层抽象 trait
///
/// 定义了客户端连接、连接标识和读写分离的基本操作。
pub trait Transport: Send + Sync + Sized {
    /// 读取端类型
    type Reader: AsyncRead + Unpin + Send;
    /// 写入端类型
    type Writer: AsyncWrite + Unpin + Send;

    /// 建立连接
    ///
    /// # Arguments
    /// * `addr` - 服务器地址，格式为 "host:port"
    /// * `config` - 传输配置
    fn connect(
        addr: &str,
        config: &TransportConfig,
    ) -> impl std::future::Future<Output = Result<Self>> + Send;

    /// 连接标识，例如 "localhost:1350"
    fn peer_name(&self) -> &str;

    /// 分离读写端
    fn split(self) -> (Self::Reader, Self::Writer);
}

// ============================================================================
// TCP 实现
// ============================================================================

/// TCP 传输实现
#[derive(Debug)]
pub struct TcpTransport {
    name: String,
    stream: TcpStream,
}

impl Transport for TcpTransport {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;

    async fn connect(addr: &str, config: &TransportConfig) -> Result<Self> {
        // 带超时的连接
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ProtocolError::ConnectionTimeout)?
            .map_err(ProtocolError::Io)?;

        stream.set_nodelay(config.nodelay)?;
        debug!("TCP connection established to {}", addr);

        Ok(Self {
            name: addr.to_string(),
            stream,
        })
    }

    fn peer_name(&self) -> &str {
        &self.name
    }

    fn split(self) -> (Self::Reader, Self::Writer) {
        self.stream.into_split()
    }
}

impl TcpTransport {
    /// 包装已接受的 TcpStream，连接标识取对端地址
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let name = stream.peer_addr()?.to_string();
        Ok(Self { name, stream })
    }
}

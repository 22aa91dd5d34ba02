//! 协议常量定义

use std::time::Duration;

/// Bifrost 服务器默认端口
pub const DEFAULT_PORT: u16 = 1350;

/// 默认服务器主机
pub const DEFAULT_HOST: &str = "localhost";

/// 每次从通道读取的最大字节数
pub const READ_BUFFER_SIZE: usize = 4096;

/// 打包输出缓冲区的初始容量
pub const WRITE_BUFFER_SIZE: usize = 1024;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 空通道的连接名
pub const NULL_CHANNEL_NAME: &str = "(null)";

// ============================================================================
// 角色名
// ============================================================================

/// 文件播放器角色
pub const ROLE_PLAYER_FILE: &str = "player/file";

/// 错误角色的显示名
pub const ROLE_ERROR_NAME: &str = "(error)";

// ============================================================================
// 入站动词（服务端 -> 客户端，大写）
// ============================================================================

/// 握手: OHAI clientId protocolId serverId
pub const VERB_OHAI: &str = "OHAI";
/// 角色分配: IAMA roleName
pub const VERB_IAMA: &str = "IAMA";
/// 已加载文件: FLOAD path
pub const VERB_FLOAD: &str = "FLOAD";
/// 开始播放
pub const VERB_PLAY: &str = "PLAY";
/// 停止播放
pub const VERB_STOP: &str = "STOP";
/// 播放到结尾
pub const VERB_END: &str = "END";
/// 已弹出
pub const VERB_EJECT: &str = "EJECT";
/// 播放位置: POS micros
pub const VERB_POS: &str = "POS";

// ============================================================================
// 出站动词（客户端 -> 服务端，小写）
// ============================================================================

/// 请求加载文件
pub const REQ_FLOAD: &str = "fload";
/// 请求播放
pub const REQ_PLAY: &str = "play";
/// 请求停止
pub const REQ_STOP: &str = "stop";
/// 请求跳到结尾
pub const REQ_END: &str = "end";
/// 请求弹出
pub const REQ_EJECT: &str = "eject";
/// 请求定位
pub const REQ_POS: &str = "pos";

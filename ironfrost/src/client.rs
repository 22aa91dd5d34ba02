//! 客户端核心实现
//!
//! 一个 [`Client`] 驱动一个连接: 读一块字节、分词、构造消息、
//! 交给当前角色，再把角色产生的消息打包写回通道。
//! 当前角色只有一个槽位，切换时整体替换，切换发生在触发消息和下一条消息之间。

use bifrost::{
    Connection, Line, LineReader, LineWriter, Message, Transport, TcpTransport, TransportConfig,
    NULL_CHANNEL_NAME,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::event::{ClientEvent, Effects, Problem};
use crate::role::{ErrorRole, PlayerRequest, Role};

/// 请求队列容量
const REQUEST_QUEUE_SIZE: usize = 32;

/// 事件队列容量，订阅者跟不上时读循环会在这里等待
const EVENT_QUEUE_SIZE: usize = 32;

/// 类型擦除的读取端
pub type DynReader = Box<dyn AsyncRead + Unpin + Send>;
/// 类型擦除的写入端
pub type DynWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// UI 一侧持有的控制句柄
pub struct ClientHandle {
    requests: mpsc::Sender<PlayerRequest>,
    shutdown: watch::Sender<bool>,
}

impl ClientHandle {
    /// 把请求交给运行循环
    pub async fn request(&self, request: PlayerRequest) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| ClientError::NotRunning)
    }

    /// 请求停止（在两次读取之间生效）
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// 运行循环一侧的控制接收端
pub struct ClientControl {
    requests: mpsc::Receiver<PlayerRequest>,
    shutdown: watch::Receiver<bool>,
}

/// 创建一对控制句柄
pub fn control() -> (ClientHandle, ClientControl) {
    let (requests_tx, requests_rx) = mpsc::channel(REQUEST_QUEUE_SIZE);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (
        ClientHandle {
            requests: requests_tx,
            shutdown: shutdown_tx,
        },
        ClientControl {
            requests: requests_rx,
            shutdown: shutdown_rx,
        },
    )
}

/// 运行循环的一步
enum Step {
    Stop(&'static str),
    Recheck,
    Lines(Vec<Line>),
    Eof,
    Request(PlayerRequest),
    RequestsClosed,
}

/// Bifrost 客户端
pub struct Client<R, W> {
    name: String,
    reader: LineReader<R>,
    writer: LineWriter<W>,
    role: Role,
    events: mpsc::Sender<ClientEvent>,
}

impl Client<DynReader, DynWriter> {
    /// 连接服务器
    ///
    /// 连接失败不会返回错误，而是得到一个绑定 `CannotConnect` 错误角色的客户端，
    /// 其通道立即结束，UI 可以统一地展示它。
    pub async fn connect(
        addr: &str,
        config: &TransportConfig,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        match TcpTransport::connect(addr, config).await {
            Ok(transport) => {
                info!("Connected to {}", addr);
                let name = transport.peer_name().to_string();
                let (reader, writer) = transport.split();
                let conn = Connection::from_parts(
                    name,
                    Box::new(reader) as DynReader,
                    Box::new(writer) as DynWriter,
                );
                Self::from_connection(conn, Role::initial())
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", addr, e);
                let conn = Connection::from_parts(
                    NULL_CHANNEL_NAME,
                    Box::new(tokio::io::empty()) as DynReader,
                    Box::new(tokio::io::sink()) as DynWriter,
                );
                Self::from_connection(conn, Role::Error(ErrorRole::cannot_connect(e.to_string())))
            }
        }
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Client<R, W> {
    /// 绑定到通道，以初始角色开始
    pub fn new(
        name: impl Into<String>,
        reader: R,
        writer: W,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        Self::with_role(name, reader, writer, Role::initial())
    }

    /// 绑定到通道，以指定角色开始
    pub fn with_role(
        name: impl Into<String>,
        reader: R,
        writer: W,
        role: Role,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        Self::from_connection(Connection::from_parts(name, reader, writer), role)
    }

    /// 从连接创建
    ///
    /// 第一个事件总是携带起始角色的 `RoleChanged`。
    pub fn from_connection(
        conn: Connection<R, W>,
        role: Role,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (events, events_rx) = mpsc::channel(EVENT_QUEUE_SIZE);
        let (name, reader, writer) = conn.split();
        let client = Self {
            name,
            reader,
            writer,
            role,
            events,
        };
        // 新建的队列一定有空位
        let _ = client
            .events
            .try_send(ClientEvent::RoleChanged(client.role.clone()));
        (client, events_rx)
    }

    /// 连接标识
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前角色
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// 运行直到通道结束、出错或收到停止信号
    ///
    /// 通道错误会结束循环并返回；单条消息的问题只作为事件报告。
    /// 返回前释放通道，只把最后的角色交还给调用者。
    pub async fn run(mut self, mut control: ClientControl) -> (Role, Result<()>) {
        info!("Client {} running", self.name);
        let result = self.run_loop(&mut control).await;
        let reason = match &result {
            Ok(reason) => {
                info!("Client {} finished: {}", self.name, reason);
                reason.to_string()
            }
            Err(e) => {
                warn!("Client {} failed: {}", self.name, e);
                e.to_string()
            }
        };

        let Self {
            reader,
            writer,
            role,
            events,
            ..
        } = self;
        drop(reader);
        drop(writer);

        let _ = events.send(ClientEvent::Disconnected { reason }).await;
        (role, result.map(|_| ()))
    }

    /// 丢弃通道，只保留当前角色
    pub fn into_role(self) -> Role {
        self.role
    }

    async fn run_loop(&mut self, control: &mut ClientControl) -> Result<&'static str> {
        let mut requests_open = true;

        loop {
            if *control.shutdown.borrow() {
                return Ok("stopped");
            }

            let step = tokio::select! {
                changed = control.shutdown.changed() => match changed {
                    Ok(()) => Step::Recheck,
                    Err(_) => Step::Stop("control handle dropped"),
                },
                // 唯一的等待点是底层读取，被其他分支抢先时不会丢数据
                chunk = self.reader.read_chunk() => match chunk? {
                    Some(lines) => Step::Lines(lines),
                    None => Step::Eof,
                },
                request = control.requests.recv(), if requests_open => match request {
                    Some(request) => Step::Request(request),
                    None => Step::RequestsClosed,
                },
            };

            match step {
                Step::Stop(reason) => return Ok(reason),
                Step::Recheck => {}
                Step::Lines(lines) => {
                    for line in lines {
                        self.handle_line(line).await?;
                    }
                }
                Step::Eof => return Ok("end of stream"),
                Step::Request(request) => self.request(request).await?,
                Step::RequestsClosed => requests_open = false,
            }
        }
    }

    /// 处理一行；不足两个单词的行被报告并丢弃
    pub async fn handle_line(&mut self, line: Line) -> Result<()> {
        match Message::from_line(line) {
            Ok(msg) => self.dispatch(msg).await,
            Err(e) => {
                warn!("{}: dropping line: {}", self.name, e);
                self.publish(ClientEvent::Problem(Problem::malformed(&e)))
                    .await;
                Ok(())
            }
        }
    }

    /// 把消息交给当前角色，必要时切换角色
    pub async fn dispatch(&mut self, msg: Message) -> Result<()> {
        debug!("{} <- {}", self.name, msg);
        let mut fx = Effects::new();
        let next = self.role.handle_message(&msg, &mut fx);
        self.apply(fx).await?;
        if let Some(role) = next {
            self.change_role(role).await;
        }
        Ok(())
    }

    /// 让当前角色发出一个请求
    pub async fn request(&mut self, request: PlayerRequest) -> Result<()> {
        let mut fx = Effects::new();
        match &self.role {
            Role::Player(player) => player.request(&request, &mut fx),
            other => {
                warn!("{}: role {:?} cannot handle {:?}", self.name, other.name(), request);
                fx.problem(Problem::RequestRejected {
                    request,
                    role: other.name().to_string(),
                });
            }
        }
        self.apply(fx).await
    }

    /// 按顺序发布事件、写出消息
    async fn apply(&mut self, fx: Effects) -> Result<()> {
        let (events, outgoing) = fx.into_parts();
        for event in events {
            self.publish(event).await;
        }
        for msg in outgoing {
            debug!("{} -> {}", self.name, msg);
            if let Err(e) = self.writer.send(&msg).await {
                warn!("{}: failed to send {}: {}", self.name, msg, e);
                return Err(e.into());
            }
            self.publish(ClientEvent::Sent(msg)).await;
        }
        Ok(())
    }

    async fn change_role(&mut self, role: Role) {
        info!(
            "{}: role changed from {:?} to {:?}",
            self.name,
            self.role.name(),
            role.name()
        );
        if let Role::Error(err) = &role {
            warn!("{}: {}", self.name, err.message());
        }
        // 旧角色在这里被丢弃
        self.role = role;
        let snapshot = self.role.clone();
        self.publish(ClientEvent::RoleChanged(snapshot)).await;
    }

    /// 队列满时等待订阅者
    async fn publish(&mut self, event: ClientEvent) {
        // 没有订阅者时直接丢弃
        let _ = self.events.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PlayerField;
    use crate::role::{ErrorRoleKind, Handshake, PlayState, PlayerRole};
    use bifrost::{ProtocolError, TcpTransport};
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio::time::{timeout, Duration};

    struct Harness {
        handle: ClientHandle,
        events: mpsc::Receiver<ClientEvent>,
        server_rx: LineReader<ReadHalf<DuplexStream>>,
        server_tx: WriteHalf<DuplexStream>,
        task: JoinHandle<(Role, Result<()>)>,
    }

    /// 在内存管道上启动一个运行中的客户端
    fn start() -> Harness {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(client_io);
        let (server_read, server_write) = tokio::io::split(server_io);

        let (client, events) = Client::new("test", reader, writer);
        let (handle, control) = control();
        let task = tokio::spawn(client.run(control));

        Harness {
            handle,
            events,
            server_rx: LineReader::new(server_read),
            server_tx: server_write,
            task,
        }
    }

    impl Harness {
        async fn send(&mut self, bytes: &[u8]) {
            self.server_tx.write_all(bytes).await.unwrap();
        }

        async fn next_event(&mut self) -> ClientEvent {
            self.events.recv().await.unwrap()
        }

        /// 跳过 MessageReceived，返回下一个其他事件
        async fn next_effect(&mut self) -> ClientEvent {
            loop {
                match self.next_event().await {
                    ClientEvent::MessageReceived(_) => continue,
                    other => return other,
                }
            }
        }

        async fn finish(self) -> (Role, Result<()>) {
            self.handle.stop();
            self.task.await.unwrap()
        }
    }

    fn changed(field: PlayerField) -> ClientEvent {
        ClientEvent::PlayerChanged(field)
    }

    #[tokio::test]
    async fn test_handshake_and_player_session() {
        let mut h = start();
        assert_eq!(h.next_event().await, ClientEvent::RoleChanged(Role::initial()));

        // 握手
        h.send(b"1 OHAI cid pid sid\n").await;
        assert_eq!(
            h.next_event().await,
            ClientEvent::MessageReceived(Message::new("1", "OHAI", ["cid", "pid", "sid"]))
        );
        assert_eq!(
            h.next_event().await,
            ClientEvent::Handshake(Handshake {
                client_id: "cid".to_string(),
                protocol_id: "pid".to_string(),
                server_id: "sid".to_string(),
            })
        );

        // 角色分配
        h.send(b"2 IAMA player/file\n").await;
        assert_eq!(
            h.next_effect().await,
            ClientEvent::RoleChanged(Role::Player(PlayerRole::new()))
        );

        // 弹出后加载
        h.send(b"3 EJECT\n3 FLOAD /tmp/song.flac\n").await;
        assert_eq!(h.next_effect().await, changed(PlayerField::State(PlayState::Ejected)));
        assert_eq!(
            h.next_effect().await,
            changed(PlayerField::LoadedFile(Some("/tmp/song.flac".to_string())))
        );
        assert_eq!(h.next_effect().await, changed(PlayerField::State(PlayState::Stopped)));

        // 播放中收到位置
        h.send(b"4 PLAY\n4 POS 125000\n").await;
        assert_eq!(h.next_effect().await, changed(PlayerField::State(PlayState::Playing)));
        assert_eq!(h.next_effect().await, changed(PlayerField::Position(125000)));

        // UI 请求被打包写出
        h.handle
            .request(PlayerRequest::Fload("/tmp/it's here.flac".to_string()))
            .await
            .unwrap();
        let sent = h.server_rx.recv().await.unwrap();
        assert_eq!(sent.word(), "fload");
        assert_eq!(sent.args(), &["/tmp/it's here.flac"]);
        assert_eq!(h.next_event().await, ClientEvent::Sent(sent));

        let (role, result) = h.finish().await;
        assert!(result.is_ok());
        let player = role.as_player().unwrap();
        assert_eq!(player.loaded_file(), Some("/tmp/song.flac"));
        assert_eq!(player.position(), 125000);
        assert_eq!(player.state(), PlayState::Playing);
    }

    #[tokio::test]
    async fn test_swap_applies_to_rest_of_chunk() {
        let mut h = start();
        h.send(b"1 IAMA player/file\n2 PLAY\n").await;

        let mut seen = Vec::new();
        loop {
            let event = h.next_effect().await;
            let done = matches!(event, ClientEvent::PlayerChanged(_));
            seen.push(event);
            if done {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                ClientEvent::RoleChanged(Role::initial()),
                ClientEvent::RoleChanged(Role::Player(PlayerRole::new())),
                changed(PlayerField::State(PlayState::Playing)),
            ]
        );
        h.finish().await;
    }

    #[tokio::test]
    async fn test_unknown_role() {
        let mut h = start();
        h.next_event().await;
        h.send(b"2 IAMA weirdrole\n").await;
        match h.next_effect().await {
            ClientEvent::RoleChanged(Role::Error(err)) => {
                assert_eq!(err.kind(), ErrorRoleKind::UnknownRole);
                assert_eq!(err.details(), &["weirdrole"]);
                assert!(err.message().contains("weirdrole"));
            }
            other => panic!("Unexpected event: {:?}", other),
        }

        // 错误角色吞掉之后的消息，连接保持打开
        h.send(b"3 PLAY\n").await;
        assert!(matches!(h.next_event().await, ClientEvent::MessageReceived(_)));

        let (role, result) = h.finish().await;
        assert!(result.is_ok());
        assert!(role.as_error().is_some());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_dropped() {
        let mut h = start();
        h.next_event().await;
        h.send(b"lonely\n\n1 OHAI a b c\n").await;

        assert!(matches!(
            h.next_event().await,
            ClientEvent::Problem(Problem::Malformed { .. })
        ));
        assert!(matches!(
            h.next_event().await,
            ClientEvent::Problem(Problem::Malformed { .. })
        ));
        assert!(matches!(h.next_effect().await, ClientEvent::Handshake(_)));
        h.finish().await;
    }

    #[tokio::test]
    async fn test_request_rejected_before_role_assignment() {
        let mut h = start();
        h.next_event().await;
        h.handle.request(PlayerRequest::Play).await.unwrap();
        assert_eq!(
            h.next_event().await,
            ClientEvent::Problem(Problem::RequestRejected {
                request: PlayerRequest::Play,
                role: String::new(),
            })
        );
        h.finish().await;
    }

    #[tokio::test]
    async fn test_end_of_stream() {
        let mut h = start();
        h.next_event().await;
        h.send(b"1 OHAI a b c\n2 IAMA player/fi").await;
        assert!(matches!(h.next_effect().await, ClientEvent::Handshake(_)));

        // 未结束的行不会被处理
        let Harness {
            handle,
            mut events,
            server_rx,
            server_tx,
            task,
        } = h;
        drop(server_tx);
        drop(server_rx);

        let (role, result) = task.await.unwrap();
        assert!(result.is_ok());
        assert!(role.as_initial().is_some());
        assert_eq!(
            events.recv().await.unwrap(),
            ClientEvent::Disconnected {
                reason: "end of stream".to_string()
            }
        );
        drop(handle);
    }

    #[tokio::test]
    async fn test_stop_signal() {
        let h = start();
        let (role, result) = h.finish().await;
        assert!(result.is_ok());
        assert!(role.as_initial().is_some());
    }

    #[tokio::test]
    async fn test_run_releases_channel() {
        let Harness {
            handle,
            mut events,
            mut server_rx,
            server_tx,
            task,
        } = start();
        assert!(matches!(events.recv().await, Some(ClientEvent::RoleChanged(_))));

        handle.stop();
        let (role, result) = task.await.unwrap();
        assert!(result.is_ok());
        assert!(role.as_initial().is_some());

        // 两个半端都已释放，对端读到结束
        assert!(server_rx.read_chunk().await.unwrap().is_none());
        assert_eq!(
            events.recv().await,
            Some(ClientEvent::Disconnected {
                reason: "stopped".to_string()
            })
        );
        assert!(events.recv().await.is_none());
        drop(server_tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_subscriber_applies_backpressure() {
        let input: String = (0..100).map(|i| format!("{i} NOOP x\n")).collect();
        let (client, mut events) =
            Client::new("slow", Cursor::new(input.into_bytes()), tokio::io::sink());
        let (_handle, control) = control();
        let mut task = tokio::spawn(client.run(control));

        // 没人读事件时读循环停在满队列上
        assert!(timeout(Duration::from_millis(100), &mut task).await.is_err());
        assert_eq!(events.len(), EVENT_QUEUE_SIZE);

        let mut received = 0;
        loop {
            let event = events.recv().await.unwrap();
            received += 1;
            assert!(events.len() <= EVENT_QUEUE_SIZE);
            if matches!(event, ClientEvent::Disconnected { .. }) {
                break;
            }
        }
        // 起始角色、100 条消息、断开
        assert_eq!(received, 102);

        let (role, result) = task.await.unwrap();
        assert!(result.is_ok());
        assert!(role.as_initial().is_some());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_block() {
        let input: String = (0..100).map(|i| format!("{i} NOOP x\n")).collect();
        let (client, events) =
            Client::new("gone", Cursor::new(input.into_bytes()), tokio::io::sink());
        drop(events);
        let (_handle, control) = control();
        let (_, result) = client.run(control).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_handle_reports_not_running() {
        let h = start();
        h.handle.stop();
        h.task.await.unwrap();
        assert!(matches!(
            h.handle.request(PlayerRequest::Play).await,
            Err(ClientError::NotRunning)
        ));
    }

    /// 所有写入都失败的写入端
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let (mut client, mut events) = Client::new("broken", tokio::io::empty(), BrokenWriter);
        client
            .dispatch(Message::new("1", "IAMA", ["player/file"]))
            .await
            .unwrap();
        assert!(client.role().as_player().is_some());

        let result = client.request(PlayerRequest::Stop).await;
        assert!(matches!(
            result,
            Err(ClientError::Channel(ProtocolError::Io(_)))
        ));

        // 失败的消息不会被报告为已发送
        let mut sent = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, ClientEvent::Sent(_)) {
                sent += 1;
            }
        }
        assert_eq!(sent, 0);

        // 通道丢弃后只剩角色
        assert!(client.into_role().as_player().is_some());
    }

    #[tokio::test]
    async fn test_connect_failure_yields_error_role() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (client, mut events) =
            Client::connect(&addr.to_string(), &TransportConfig::default()).await;
        assert_eq!(client.name(), "(null)");
        let err = client.role().as_error().unwrap();
        assert_eq!(err.kind(), ErrorRoleKind::CannotConnect);
        assert!(err.message().starts_with("Could not connect to the Bifrost server: "));

        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::RoleChanged(Role::Error(_))
        ));

        // 空通道立即结束
        let (_handle, control) = control();
        let (role, result) = client.run(control).await;
        assert!(result.is_ok());
        assert!(role.as_error().is_some());
        assert!(matches!(
            events.recv().await.unwrap(),
            ClientEvent::Disconnected { .. }
        ));
    }

    #[tokio::test]
    async fn test_connect_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (_, _reader, mut writer) =
                Connection::new(TcpTransport::from_stream(stream).unwrap()).split();
            writer.send(&Message::new("1", "OHAI", ["c", "p", "s"])).await.unwrap();
            writer.send(&Message::new("2", "IAMA", ["player/file"])).await.unwrap();
            writer.send(&Message::new("3", "FLOAD", ["/music/a b.flac"])).await.unwrap();
            // 之后关闭连接
        });

        let (client, _events) =
            Client::connect(&addr.to_string(), &TransportConfig::default()).await;
        assert_eq!(client.name(), addr.to_string());

        let (_handle, control) = control();
        let (role, result) = client.run(control).await;
        result.unwrap();
        server.await.unwrap();

        let player = role.as_player().unwrap();
        assert_eq!(player.loaded_file(), Some("/music/a b.flac"));
        assert_eq!(player.state(), PlayState::Unknown);
    }
}

//! Ironfrost 客户端
//!
//! 无界面的控制台: 连接 Bifrost 服务器，记录所有事件，从标准输入读取命令。

use anyhow::Result;
use bifrost::{Tokenizer, TransportConfig, DEFAULT_HOST, DEFAULT_PORT, READ_BUFFER_SIZE};
use ironfrost::{control, parse_command, Client, ClientEvent, ConsoleCommand, Role};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ironfrost=debug".parse()?)
                .add_directive("bifrost=debug".parse()?),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT));

    info!("Connecting to {}", addr);
    let (client, mut events) = Client::connect(&addr, &TransportConfig::default()).await;
    let (handle, control) = control();

    let mut client_task = tokio::spawn(client.run(control));
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let mut stdin = tokio::io::stdin();
    let mut tokenizer = Tokenizer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let run_result = 'input: loop {
        let n = tokio::select! {
            read = stdin.read(&mut buf) => read?,
            // 客户端先结束（服务器断开或连接失败）
            result = &mut client_task => break 'input Some(result?),
        };
        if n == 0 {
            break None;
        }

        for line in tokenizer.feed(&buf[..n]) {
            if line.is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(ConsoleCommand::Quit) => break 'input None,
                Ok(ConsoleCommand::Request(request)) => {
                    if let Err(e) = handle.request(request).await {
                        warn!("{}", e);
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    };

    handle.stop();
    let (role, run_result) = match run_result {
        Some(finished) => finished,
        None => client_task.await?,
    };
    event_task.await?;
    info!("Final role: {:?}", role.name());
    run_result?;

    Ok(())
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::MessageReceived(msg) => info!("<- {}", msg),
        ClientEvent::Sent(msg) => info!("-> {}", msg),
        ClientEvent::Handshake(handshake) => info!(
            "Server {} speaks {} (client id {})",
            handshake.server_id, handshake.protocol_id, handshake.client_id
        ),
        ClientEvent::PlayerChanged(field) => info!("Player: {:?}", field),
        ClientEvent::RoleChanged(Role::Error(err)) => warn!("{}", err.message()),
        ClientEvent::RoleChanged(role) => info!("Role: {:?}", role.name()),
        ClientEvent::Problem(problem) => warn!("{:?}", problem),
        ClientEvent::Disconnected { reason } => info!("Disconnected: {}", reason),
    }
}

//! 控制台命令解析
//!
//! 控制台输入和线上格式使用同一个分词器，所以引号规则一致:
//! `fload '/music/my song.flac'`

use bifrost::{REQ_EJECT, REQ_END, REQ_FLOAD, REQ_PLAY, REQ_POS, REQ_STOP};

use crate::role::PlayerRequest;

/// 控制台命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Request(PlayerRequest),
    Quit,
}

/// 解析一行控制台输入
pub fn parse_command(words: &[String]) -> Result<ConsoleCommand, String> {
    let Some((verb, args)) = words.split_first() else {
        return Err("empty command".to_string());
    };

    let request = match (verb.to_ascii_lowercase().as_str(), args) {
        ("quit" | "exit", []) => return Ok(ConsoleCommand::Quit),
        (REQ_FLOAD, [path]) => PlayerRequest::Fload(path.clone()),
        (REQ_PLAY, []) => PlayerRequest::Play,
        (REQ_STOP, []) => PlayerRequest::Stop,
        (REQ_EJECT, []) => PlayerRequest::Eject,
        (REQ_END, []) => PlayerRequest::End,
        (REQ_POS, [micros]) => {
            let micros = micros
                .parse::<u64>()
                .map_err(|e| format!("invalid position {:?}: {}", micros, e))?;
            PlayerRequest::Pos(micros)
        }
        (other, _) => {
            return Err(format!(
                "unknown command or wrong arguments: {} (try fload <path>, play, stop, eject, end, pos <micros>, quit)",
                other
            ))
        }
    };
    Ok(ConsoleCommand::Request(request))
}

//! 消息类型定义
//!
//! 每条消息是一行: `<tag> <word> [<arg> ...]`。

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::packer;
use crate::tokenizer::Line;

/// 一条 Bifrost 消息
///
/// 只能由至少两个单词（tag、word）的行构造。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    tag: String,
    word: String,
    args: Vec<String>,
}

impl Message {
    /// 直接构造消息
    pub fn new<I, S>(tag: impl Into<String>, word: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            word: word.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// 从分词得到的行构造消息
    pub fn from_line(line: Line) -> Result<Self> {
        if line.len() < 2 {
            return Err(ProtocolError::MalformedMessage { words: line.len() });
        }
        let mut words = line.into_iter();
        // 上面已检查长度
        let tag = words.next().unwrap_or_default();
        let word = words.next().unwrap_or_default();
        Ok(Self {
            tag,
            word,
            args: words.collect(),
        })
    }

    /// 请求/响应关联标签
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 动词
    pub fn word(&self) -> &str {
        &self.word
    }

    /// tag 和 word 之后的参数
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// 第 `i` 个参数
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    /// 检查参数个数
    pub fn expect_args(&self, expected: usize) -> Result<()> {
        if self.args.len() != expected {
            return Err(ProtocolError::BadArity {
                word: self.word.clone(),
                expected,
                actual: self.args.len(),
            });
        }
        Ok(())
    }

    /// 按 `[tag, word, ...args]` 顺序遍历所有单词
    pub fn words(&self) -> impl Iterator<Item = &str> {
        [self.tag.as_str(), self.word.as_str()]
            .into_iter()
            .chain(self.args.iter().map(String::as_str))
    }

    /// 转换回行
    pub fn to_line(&self) -> Line {
        self.words().map(str::to_string).collect()
    }

    /// 转换回行（消耗自身）
    pub fn into_line(self) -> Line {
        let mut line = Vec::with_capacity(self.args.len() + 2);
        line.push(self.tag);
        line.push(self.word);
        line.extend(self.args);
        line
    }

    /// 打包为线上格式（含结尾的 `\n`）
    pub fn pack(&self) -> Vec<u8> {
        let words: Vec<&str> = self.words().collect();
        packer::pack(words.as_slice())
    }
}

impl TryFrom<Line> for Message {
    type Error = ProtocolError;

    fn try_from(line: Line) -> Result<Self> {
        Self::from_line(line)
    }
}

impl From<Message> for Line {
    fn from(msg: Message) -> Self {
        msg.into_line()
    }
}

/// 线上格式，不含结尾的换行
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let packed = self.pack();
        let text = String::from_utf8_lossy(&packed);
        f.write_str(text.trim_end_matches('\n'))
    }
}

/// 生成新的请求标签（16 个小写十六进制字符，64 位随机数）
///
/// 标签只用于将来的请求/响应关联，核心不检查唯一性。
pub fn fresh_tag() -> String {
    let bytes: [u8; 8] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

//! 行打包
//!
//! 分词器的编码端: 单词之间用一个空格分隔，行以 `\n` 结束。
//! 含有空白、引号或反斜杠的单词整体用单引号包起来，
//! 单词内部的 `'` 替换为 `'\''`（先闭合引号，转义一个引号，再重新打开）。
//! 打包器输出的任何内容都能被 [`Tokenizer`](crate::Tokenizer) 还原为原来的单词。

use crate::tokenizer::is_separator;
use crate::WRITE_BUFFER_SIZE;

/// 引号内单引号的替换序列
const ESCAPED_QUOTE: &[u8] = b"'\\''";

/// 单词是否需要加引号
///
/// 空单词也需要，否则它会在线上消失。
pub fn needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word
            .bytes()
            .any(|b| is_separator(b) || matches!(b, b'\'' | b'"' | b'\\'))
}

/// 把一行单词打包为线上格式
pub fn pack<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(WRITE_BUFFER_SIZE);
    pack_into(&mut buf, words);
    buf
}

/// 把一行单词追加到 `buf`
pub fn pack_into<S: AsRef<str>>(buf: &mut Vec<u8>, words: &[S]) {
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        pack_word(buf, word.as_ref());
    }
    buf.push(b'\n');
}

fn pack_word(buf: &mut Vec<u8>, word: &str) {
    if !needs_quoting(word) {
        buf.extend_from_slice(word.as_bytes());
        return;
    }

    buf.push(b'\'');
    for &b in word.as_bytes() {
        if b == b'\'' {
            buf.extend_from_slice(ESCAPED_QUOTE);
        } else {
            buf.push(b);
        }
    }
    buf.push(b'\'');
}

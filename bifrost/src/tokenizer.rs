//! 增量分词器
//!
//! 把任意切分的字节流转换为完整的行，每行是一组单词。
//! 引号规则与 shell 类似:
//!
//! ```text
//! 字节    │ 无引号                  │ 单引号内   │ 双引号内
//! ────────┼─────────────────────────┼────────────┼───────────────────
//! \n      │ 结束单词和行，产出 Line │ 原样追加   │ 原样追加
//! '       │ 进入单引号              │ 回到无引号 │ 原样追加
//! "       │ 进入双引号              │ 原样追加   │ 回到无引号
//! \       │ 下一个字节原样追加      │ 原样追加   │ 下一个字节原样追加
//! 空白    │ 结束当前单词            │ 原样追加   │ 原样追加
//! 其他    │ 追加到当前单词          │ 原样追加   │ 原样追加
//! ```
//!
//! 状态（未完成的单词、未完成的行、引号/转义模式）在多次 `feed` 之间保留，
//! 所以分多块喂入与一次喂入全部字节的结果完全相同。

/// 一行: 按顺序排列的单词
pub type Line = Vec<String>;

/// 分隔符判断，分词器与打包器共用
///
/// 只包含 ASCII 空白，多字节 UTF-8 序列中不会出现这些字节。
pub fn is_separator(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r')
}

/// 分词模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
    /// 下一个字节原样追加，然后回到 `resume`
    EscapeNext,
}

/// 分词器
///
/// 每个连接独占一个实例，不在读写之间共享。
#[derive(Debug)]
pub struct Tokenizer {
    mode: Mode,
    /// 转义结束后要回到的模式
    resume: Mode,
    word: Vec<u8>,
    line: Line,
    /// 是否正处于一个单词中（空白之间不产出空单词）
    in_word: bool,
}

impl Tokenizer {
    /// 创建新的分词器
    pub fn new() -> Self {
        Self {
            mode: Mode::Unquoted,
            resume: Mode::Unquoted,
            word: Vec::new(),
            line: Vec::new(),
            in_word: false,
        }
    }

    /// 喂入一块字节，返回本次调用中完成的所有行
    ///
    /// 只有未加引号、未转义的 `\n` 才会结束一行。
    /// 末尾未结束的单词或行会保留到后续的 `\n` 到来。
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Line> {
        let mut lines = Vec::new();
        for &b in bytes {
            self.step(b, &mut lines);
        }
        lines
    }

    /// 没有任何未完成的状态
    pub fn is_idle(&self) -> bool {
        self.mode == Mode::Unquoted && !self.in_word && self.line.is_empty()
    }

    fn step(&mut self, b: u8, lines: &mut Vec<Line>) {
        match self.mode {
            Mode::Unquoted => match b {
                b'\n' => lines.push(self.finish_line()),
                b'\'' => self.enter(Mode::SingleQuoted),
                b'"' => self.enter(Mode::DoubleQuoted),
                b'\\' => self.escape(),
                _ if is_separator(b) => self.finish_word(),
                _ => self.push_byte(b),
            },
            Mode::SingleQuoted => match b {
                b'\'' => self.mode = Mode::Unquoted,
                _ => self.push_byte(b),
            },
            Mode::DoubleQuoted => match b {
                b'"' => self.mode = Mode::Unquoted,
                b'\\' => self.escape(),
                _ => self.push_byte(b),
            },
            Mode::EscapeNext => {
                self.push_byte(b);
                self.mode = self.resume;
            }
        }
    }

    fn enter(&mut self, mode: Mode) {
        self.in_word = true;
        self.mode = mode;
    }

    fn escape(&mut self) {
        self.resume = self.mode;
        self.mode = Mode::EscapeNext;
    }

    fn push_byte(&mut self, b: u8) {
        self.in_word = true;
        self.word.push(b);
    }

    fn finish_word(&mut self) {
        if !self.in_word {
            return;
        }
        self.in_word = false;
        let word = String::from_utf8_lossy(&self.word).into_owned();
        self.word.clear();
        self.line.push(word);
    }

    fn finish_line(&mut self) -> Line {
        // 行尾同时也是单词的结尾
        self.finish_word();
        std::mem::take(&mut self.line)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

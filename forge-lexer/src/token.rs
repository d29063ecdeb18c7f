use std::fmt;

/// The kind of a lexed token.
///
/// `Punct` carries the raw ASCII byte for any single-character symbol that
/// did not participate in a multi-character operator match; the other
/// `*Equals`/`*Star`/etc. variants are the greedy 2- and 3-byte operator
/// matches. `Utf2`/`Utf3`/`Utf4` mark a complete multi-byte UTF-8 sequence
/// encountered outside an identifier or literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Punct(u8),

    EqualsEquals,
    LogicalAnd,
    LogicalOr,
    PlusPlus,
    MinusMinus,
    StarEquals,
    SlashEquals,
    PercentEquals,
    PlusEquals,
    MinusEquals,
    AmpersandEquals,
    PipeEquals,
    CaretEquals,
    LeftShiftEquals,
    RightShiftEquals,
    GreaterEquals,
    LessEquals,
    StarSlash,
    SlashStar,
    SlashSlash,
    Arrow,
    DoubleColon,
    Ellipsis,
    LeftShift,
    RightShift,

    StringLiteral,
    CharLiteral,
    IntegerLiteral,
    FloatLiteral,
    HexLiteral,
    BinaryLiteral,

    Alpha,
    Keyword,

    Utf2,
    Utf3,
    Utf4,

    /// Any byte that matched none of the above categories.
    Special,
}

/// A single lexed token.
///
/// `start`/`end` are byte offsets into the lexed source. For
/// `StringLiteral`/`CharLiteral` tokens, `text` holds the escape-decoded
/// contents (since that can differ in length from the raw `start..end`
/// slice); it is `None` for every other kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub kind: TokenKind,
    pub extra: u32,
    pub text: Option<String>,
}

impl Token {
    pub fn new(start: usize, end: usize, line: usize, kind: TokenKind) -> Self {
        Token { start, end, line, kind, extra: 0, text: None }
    }

    pub fn with_extra(mut self, extra: u32) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw source slice this token spans, or the decoded `text` for
    /// string/char literals.
    pub fn view<'a>(&'a self, source: &'a [u8]) -> &'a str {
        if let Some(text) = &self.text {
            text.as_str()
        } else {
            std::str::from_utf8(&source[self.start..self.end]).unwrap_or("")
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}..{}", self.kind, self.line, self.start, self.end)
    }
}

//! A table-driven, UTF-8-aware lexer shared by the TDL parser
//! (`forge-tdl`) and the IR parser (`forge-ir`).
//!
//! Byte classification is a single 256-entry lookup table, built once and
//! reused: every byte maps to `Alpha`, `Number`, `Symbol`,
//! one of the UTF-8 lead-byte/continuation-byte classes, or `Other`. The
//! lexer proceeds byte-by-byte using that classification to decide which
//! of the `Normal`/`Symbol`/`Alpha`/`Number`/`String`/`Comment` states to
//! enter next.

mod error;
mod keywords;
mod split;
mod token;

pub use error::{LexError, LexResult};
pub use keywords::{ir_keywords, keyword_name, tdl_keywords, KeywordMap};
pub use split::lex_parallel;
pub use token::{Token, TokenKind};

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Alpha,
    Number,
    Symbol,
    Utf2,
    Utf3,
    Utf4,
    UtfContinue,
    Space,
    Newline,
    Other,
}

const SYMBOLS: &[u8] = b"!@#$%^&*()_+-={}[]|\\?><,./\"':;~`";

fn build_lookup() -> [ByteClass; 256] {
    let mut table = [ByteClass::Other; 256];
    for b in SYMBOLS {
        table[*b as usize] = ByteClass::Symbol;
    }
    for b in b'A'..=b'Z' {
        table[b as usize] = ByteClass::Alpha;
    }
    for b in b'a'..=b'z' {
        table[b as usize] = ByteClass::Alpha;
    }
    table[b'_' as usize] = ByteClass::Alpha;
    for b in b'0'..=b'9' {
        table[b as usize] = ByteClass::Number;
    }
    table[b' ' as usize] = ByteClass::Space;
    table[b'\t' as usize] = ByteClass::Space;
    table[b'\r' as usize] = ByteClass::Space;
    table[b'\n' as usize] = ByteClass::Newline;
    for b in 0x80..=0xBFu16 {
        table[b as usize] = ByteClass::UtfContinue;
    }
    for b in 0xC0..=0xDFu16 {
        table[b as usize] = ByteClass::Utf2;
    }
    for b in 0xE0..=0xEFu16 {
        table[b as usize] = ByteClass::Utf3;
    }
    for b in 0xF0..=0xF7u16 {
        table[b as usize] = ByteClass::Utf4;
    }
    table
}

fn lookup() -> &'static [ByteClass; 256] {
    static TABLE: OnceLock<[ByteClass; 256]> = OnceLock::new();
    TABLE.get_or_init(build_lookup)
}

/// Lexer configuration: the keyword table and comment delimiters.
/// Cloned cheaply (the keyword map is shared via the caller's choice of
/// `ir_keywords()`/`tdl_keywords()`, which are small).
#[derive(Debug, Clone, Default)]
pub struct LexerConfig {
    pub keywords: KeywordMap,
    pub line_comment: String,
    pub multiline_start: String,
    pub multiline_end: String,
}

impl LexerConfig {
    pub fn new(keywords: KeywordMap) -> Self {
        LexerConfig {
            keywords,
            line_comment: "//".to_string(),
            multiline_start: "/*".to_string(),
            multiline_end: "*/".to_string(),
        }
    }
}

/// Lex every escape found inside a string/char literal body.
/// Unknown escapes decode to `'\0'` rather than being rejected.
fn decode_escape(c: u8) -> u8 {
    match c {
        b'\'' => b'\'',
        b'"' => b'"',
        b'\\' => b'\\',
        b'0' => 0,
        b'a' => 0x07,
        b'b' => 0x08,
        b'e' => 0x1B,
        b'f' => 0x0C,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0B,
        _ => 0,
    }
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    config: &'a LexerConfig,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a [u8], config: &'a LexerConfig, start_line: usize) -> Self {
        Lexer { src, pos: 0, line: start_line, config }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.src[self.pos..].starts_with(needle.as_bytes())
    }

    fn run(mut self) -> LexResult<Vec<Token>> {
        let mut out = Vec::new();
        let table = lookup();

        while self.pos < self.src.len() {
            let b = self.src[self.pos];

            if table[b as usize] == ByteClass::Newline {
                self.line += 1;
                self.pos += 1;
                continue;
            }
            if table[b as usize] == ByteClass::Space {
                self.pos += 1;
                continue;
            }

            if !self.config.line_comment.is_empty() && self.starts_with(&self.config.line_comment) {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if !self.config.multiline_start.is_empty() && self.starts_with(&self.config.multiline_start) {
                let start_line = self.line;
                self.pos += self.config.multiline_start.len();
                loop {
                    if self.pos >= self.src.len() {
                        return Err(LexError::new(start_line, "unterminated block comment"));
                    }
                    if self.starts_with(&self.config.multiline_end) {
                        self.pos += self.config.multiline_end.len();
                        break;
                    }
                    if self.src[self.pos] == b'\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
                continue;
            }

            match table[b as usize] {
                ByteClass::Alpha => out.push(self.lex_alpha()),
                ByteClass::Number => out.push(self.lex_number()?),
                ByteClass::Symbol if b == b'"' => out.push(self.lex_quoted(b'"', TokenKind::StringLiteral)?),
                ByteClass::Symbol if b == b'\'' => out.push(self.lex_quoted(b'\'', TokenKind::CharLiteral)?),
                ByteClass::Symbol => out.push(self.lex_symbol()),
                ByteClass::Utf2 => out.push(self.lex_utf_seq(2, TokenKind::Utf2)?),
                ByteClass::Utf3 => out.push(self.lex_utf_seq(3, TokenKind::Utf3)?),
                ByteClass::Utf4 => out.push(self.lex_utf_seq(4, TokenKind::Utf4)?),
                ByteClass::UtfContinue => {
                    return Err(LexError::new(
                        self.line,
                        format!("stray UTF-8 continuation byte 0x{b:02X}"),
                    ));
                }
                ByteClass::Space | ByteClass::Newline => unreachable!("handled above"),
                ByteClass::Other => {
                    let start = self.pos;
                    self.pos += 1;
                    out.push(Token::new(start, self.pos, self.line, TokenKind::Special));
                }
            }
        }

        Ok(out)
    }

    fn lex_alpha(&mut self) -> Token {
        let start = self.pos;
        let line = self.line;
        let table = lookup();
        while self.pos < self.src.len()
            && matches!(table[self.src[self.pos] as usize], ByteClass::Alpha | ByteClass::Number)
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        if let Some(&id) = self.config.keywords.get(text) {
            Token::new(start, self.pos, line, TokenKind::Keyword).with_extra(id)
        } else {
            Token::new(start, self.pos, line, TokenKind::Alpha)
        }
    }

    fn lex_number(&mut self) -> LexResult<Token> {
        let start = self.pos;
        let line = self.line;
        let table = lookup();

        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            while self.pos < self.src.len() && self.src[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
            return Ok(Token::new(start, self.pos, line, TokenKind::HexLiteral));
        }
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'b') | Some(b'B')) {
            self.pos += 2;
            while matches!(self.peek(0), Some(b'0') | Some(b'1')) {
                self.pos += 1;
            }
            return Ok(Token::new(start, self.pos, line, TokenKind::BinaryLiteral));
        }

        while self.pos < self.src.len() && table[self.src[self.pos] as usize] == ByteClass::Number {
            self.pos += 1;
        }
        let mut is_float = false;
        if self.peek(0) == Some(b'.') && matches!(self.peek(1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.pos += 1;
            while self.pos < self.src.len() && table[self.src[self.pos] as usize] == ByteClass::Number {
                self.pos += 1;
            }
        }
        let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntegerLiteral };
        Ok(Token::new(start, self.pos, line, kind))
    }

    fn lex_quoted(&mut self, quote: u8, kind: TokenKind) -> LexResult<Token> {
        let start = self.pos;
        let line = self.line;
        self.pos += 1; // opening quote
        let mut decoded = String::new();
        loop {
            match self.peek(0) {
                None => return Err(LexError::new(line, "unterminated string/char literal")),
                Some(b'\n') => return Err(LexError::new(line, "unterminated string/char literal")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek(0) {
                        None => return Err(LexError::new(line, "unterminated escape sequence")),
                        Some(e) => {
                            decoded.push(decode_escape(e) as char);
                            self.pos += 1;
                        }
                    }
                }
                Some(c) => {
                    decoded.push(c as char);
                    self.pos += 1;
                }
            }
        }
        Ok(Token::new(start, self.pos, line, kind).with_text(decoded))
    }

    /// Greedy 3-, then 2-, then 1-byte symbol match, ported from the
    /// source lexer's `Lexer::match` switch table.
    fn lex_symbol(&mut self) -> Token {
        let start = self.pos;
        let line = self.line;
        let lhs = self.src[self.pos];
        let mid = self.peek(1);
        let rhs = self.peek(2);

        if let (Some(m), Some(r)) = (mid, rhs) {
            if let Some(kind) = match3(lhs, m, r) {
                self.pos += 3;
                return Token::new(start, self.pos, line, kind);
            }
        }
        if let Some(m) = mid {
            if let Some(kind) = match2(lhs, m) {
                self.pos += 2;
                return Token::new(start, self.pos, line, kind);
            }
        }
        self.pos += 1;
        Token::new(start, self.pos, line, TokenKind::Punct(lhs))
    }

    fn lex_utf_seq(&mut self, width: usize, kind: TokenKind) -> LexResult<Token> {
        let start = self.pos;
        let line = self.line;
        let table = lookup();
        self.pos += 1;
        let mut continuations = 1;
        while continuations < width && table[self.peek(0).unwrap_or(0) as usize] == ByteClass::UtfContinue {
            self.pos += 1;
            continuations += 1;
        }
        if continuations != width {
            return Err(LexError::new(line, format!("truncated {width}-byte UTF-8 sequence")));
        }
        Ok(Token::new(start, self.pos, line, kind))
    }
}

fn match2(lhs: u8, mid: u8) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match (lhs, mid) {
        (b'=', b'=') => EqualsEquals,
        (b'&', b'&') => LogicalAnd,
        (b'&', b'=') => AmpersandEquals,
        (b'|', b'|') => LogicalOr,
        (b'|', b'=') => PipeEquals,
        (b'+', b'+') => PlusPlus,
        (b'+', b'=') => PlusEquals,
        (b'-', b'-') => MinusMinus,
        (b'-', b'=') => MinusEquals,
        (b'-', b'>') => Arrow,
        (b'*', b'=') => StarEquals,
        (b'*', b'/') => StarSlash,
        (b'/', b'=') => SlashEquals,
        (b'/', b'*') => SlashStar,
        (b'/', b'/') => SlashSlash,
        (b'%', b'=') => PercentEquals,
        (b'^', b'=') => CaretEquals,
        (b':', b':') => DoubleColon,
        (b'<', b'=') => LessEquals,
        (b'<', b'<') => LeftShift,
        (b'>', b'=') => GreaterEquals,
        (b'>', b'>') => RightShift,
        _ => return None,
    })
}

fn match3(lhs: u8, mid: u8, rhs: u8) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match (lhs, mid, rhs) {
        (b'<', b'<', b'=') => LeftShiftEquals,
        (b'.', b'.', b'.') => Ellipsis,
        (b'>', b'>', b'=') => RightShiftEquals,
        _ => return None,
    })
}

/// Lex an entire source buffer in a single pass.
pub fn lex(src: &[u8], config: &LexerConfig) -> LexResult<Vec<Token>> {
    Lexer::new(src, config, 1).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tdl_assignment_line_lexes_to_keyword_equals_alpha() {
        let cfg = LexerConfig::new(tdl_keywords());
        let toks = lex(b"target = x86_64", &cfg).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(keyword_name(&cfg.keywords, toks[0].extra), Some("target"));
        assert_eq!(toks[1].kind, TokenKind::Punct(b'='));
        assert_eq!(toks[2].kind, TokenKind::Alpha);
        assert_eq!(toks[2].view(b"target = x86_64"), "x86_64");
    }

    #[test]
    fn every_keyword_round_trips_through_its_token_id() {
        for map in [tdl_keywords(), ir_keywords()] {
            let cfg = LexerConfig::new(map.clone());
            for (word, id) in &map {
                let toks = lex(word.as_bytes(), &cfg).unwrap();
                assert_eq!(toks.len(), 1, "keyword {word:?} should lex to one token");
                assert_eq!(toks[0].kind, TokenKind::Keyword);
                assert_eq!(toks[0].extra, *id);
            }
        }
    }

    #[test]
    fn multi_char_operators_greedy_match() {
        let cfg = LexerConfig::new(KeywordMap::new());
        let toks = lex(b"<<= ... >>= << < <=", &cfg).unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftShiftEquals,
                TokenKind::Ellipsis,
                TokenKind::RightShiftEquals,
                TokenKind::LeftShift,
                TokenKind::Punct(b'<'),
                TokenKind::LessEquals,
            ]
        );
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let cfg = LexerConfig::new(KeywordMap::new());
        let toks = lex(br#""a\nb\"c""#, &cfg).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::StringLiteral);
        assert_eq!(toks[0].text.as_deref(), Some("a\nb\"c"));
    }

    #[test]
    fn line_and_block_comments_are_skipped() {
        let cfg = LexerConfig::new(KeywordMap::new());
        let src = b"a // comment\nb /* block\nspans lines */ c";
        let toks = lex(src, &cfg).unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Alpha, TokenKind::Alpha, TokenKind::Alpha]);
        assert_eq!(toks[2].line, 3);
    }

    #[test]
    fn numbers_dispatch_by_prefix() {
        let cfg = LexerConfig::new(KeywordMap::new());
        let toks = lex(b"0x1F 0b101 42 3.14", &cfg).unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::HexLiteral,
                TokenKind::BinaryLiteral,
                TokenKind::IntegerLiteral,
                TokenKind::FloatLiteral,
            ]
        );
    }

    #[test]
    fn stray_continuation_byte_errors() {
        let cfg = LexerConfig::new(KeywordMap::new());
        let err = lex(&[0x80], &cfg).unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn well_formed_multibyte_utf8_is_one_token() {
        let cfg = LexerConfig::new(KeywordMap::new());
        // "é" is 2 bytes, U+00E9 = 0xC3 0xA9
        let toks = lex("é".as_bytes(), &cfg).unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Utf2);
    }
}

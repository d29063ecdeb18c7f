//! Two-way chunk-parallel lexing.
//!
//! `lex` already produces the same tokens regardless of how the source
//! is carved up, as long as a chunk boundary never falls inside a
//! string/char literal, a block comment, or a multi-byte UTF-8 sequence.
//! `find_split` looks for such a safe boundary near the midpoint; the two
//! halves are then lexed independently (on a scoped thread for the
//! first half) and merged by offsetting the second half's byte offsets
//! and line numbers.

use crate::{lex, LexError, LexResult, LexerConfig, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Str(u8),
    LineComment,
    BlockComment,
}

/// Find a byte offset near the midpoint of `source` that is safe to
/// split on: outside any string/char literal, outside any comment, and
/// on a UTF-8 character boundary. Falls back to `source.len()` (i.e. "do
/// not split") if no such offset exists.
fn find_split(source: &[u8], config: &LexerConfig) -> usize {
    let midpoint = source.len() / 2;
    if midpoint == 0 {
        return source.len();
    }

    let mut state = ScanState::Normal;
    let mut candidates = Vec::new();
    let mut i = 0;
    while i < source.len() {
        let b = source[i];
        match state {
            ScanState::Normal => {
                if b == b'\n' {
                    candidates.push(i + 1);
                } else if b == b'"' || b == b'\'' {
                    state = ScanState::Str(b);
                } else if !config.line_comment.is_empty()
                    && source[i..].starts_with(config.line_comment.as_bytes())
                {
                    state = ScanState::LineComment;
                } else if !config.multiline_start.is_empty()
                    && source[i..].starts_with(config.multiline_start.as_bytes())
                {
                    state = ScanState::BlockComment;
                }
            }
            ScanState::Str(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    state = ScanState::Normal;
                }
            }
            ScanState::LineComment => {
                if b == b'\n' {
                    state = ScanState::Normal;
                    candidates.push(i + 1);
                }
            }
            ScanState::BlockComment => {
                if !config.multiline_end.is_empty() && source[i..].starts_with(config.multiline_end.as_bytes()) {
                    i += config.multiline_end.len();
                    state = ScanState::Normal;
                    continue;
                }
            }
        }
        i += 1;
    }

    candidates
        .into_iter()
        .filter(|&c| c <= source.len())
        .min_by_key(|&c| c.abs_diff(midpoint))
        .unwrap_or(source.len())
}

fn line_count(chunk: &[u8]) -> usize {
    chunk.iter().filter(|&&b| b == b'\n').count()
}

fn offset_tokens(tokens: Vec<Token>, byte_offset: usize, line_offset: usize) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|mut t| {
            t.start += byte_offset;
            t.end += byte_offset;
            t.line += line_offset;
            t
        })
        .collect()
}

/// Lex `source` using a two-way split across a scoped thread, producing
/// exactly the tokens a single-pass `lex` call would.
pub fn lex_parallel(source: &[u8], config: &LexerConfig) -> LexResult<Vec<Token>> {
    let split = find_split(source, config);
    if split == 0 || split >= source.len() {
        return lex(source, config);
    }

    let (first, second) = source.split_at(split);
    let first_lines = line_count(first);

    let (first_result, second_result) = std::thread::scope(|scope| {
        let handle = scope.spawn(|| lex(first, config));
        let second_result = lex(second, config);
        (handle.join().unwrap_or_else(|_| Err(LexError::new(0, "lexer thread panicked"))), second_result)
    });

    let mut merged = first_result?;
    let second_tokens = offset_tokens(second_result?, split, first_lines);
    merged.extend(second_tokens);
    Ok(merged)
}

use crate::ast::*;
use crate::error::ParseError;
use forge_lexer::{lex, tdl_keywords, LexerConfig, Token, TokenKind};

struct Cursor<'a> {
    source: &'a [u8],
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a [u8], tokens: Vec<Token>) -> Self {
        Cursor { source, tokens, pos: 0 }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn line(&self) -> usize {
        self.current().map(|t| t.line).unwrap_or(0)
    }

    fn text(&self, tok: &Token) -> &str {
        tok.view(self.source)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Keyword && self.text(t) == word)
    }

    fn is_punct(&self, byte: u8) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Punct(byte))
    }

    fn is_alpha(&self) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Alpha)
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expect_punct(&mut self, byte: u8) -> Result<(), ParseError> {
        if self.is_punct(byte) {
            self.bump();
            Ok(())
        } else {
            Err(ParseError::new(self.line(), format!("expected '{}'", byte as char)))
        }
    }

    fn expect_alpha(&mut self) -> Result<String, ParseError> {
        if self.is_alpha() {
            let tok = self.bump().unwrap();
            Ok(self.text(&tok).to_string())
        } else {
            Err(ParseError::new(self.line(), "expected identifier"))
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.current() {
            Some(t) if t.kind == TokenKind::StringLiteral => {
                let tok = self.bump().unwrap();
                Ok(tok.text.clone().unwrap_or_default())
            }
            _ => Err(ParseError::new(self.line(), "expected string literal")),
        }
    }

    fn expect_int(&mut self) -> Result<u64, ParseError> {
        match self.current() {
            Some(t) if t.kind == TokenKind::IntegerLiteral => {
                let tok = self.bump().unwrap();
                self.text(&tok).parse::<u64>().map_err(|_| ParseError::new(tok.line, "malformed integer literal"))
            }
            _ => Err(ParseError::new(self.line(), "expected integer literal")),
        }
    }
}

/// Parse target description source text into a `TargetOutput`. Fails
/// fast: the returned error is paired with whatever was accumulated
/// before the failing token.
pub fn parse(source: &[u8]) -> (TargetOutput, Option<ParseError>) {
    let cfg = LexerConfig::new(tdl_keywords());
    let tokens = match lex(source, &cfg) {
        Ok(t) => t,
        Err(e) => return (TargetOutput::default(), Some(ParseError::new(e.line, e.what))),
    };
    let mut cur = Cursor::new(source, tokens);
    let mut out = TargetOutput::default();

    while !cur.eof() {
        if cur.is_keyword("target") {
            if let Err(e) = parse_target(&mut cur, &mut out) {
                return (out, Some(e));
            }
        } else if cur.is_keyword("endian") {
            if let Err(e) = parse_endian(&mut cur, &mut out) {
                return (out, Some(e));
            }
        } else if cur.is_keyword("regclass") {
            if let Err(e) = parse_name_list(&mut cur, &mut out.regclasses) {
                return (out, Some(e));
            }
        } else if cur.is_keyword("extension") {
            if let Err(e) = parse_name_list(&mut cur, &mut out.extensions) {
                return (out, Some(e));
            }
        } else if cur.is_keyword("register") {
            match parse_register(&mut cur) {
                Ok(reg) => out.registers.push(reg),
                Err(e) => return (out, Some(e)),
            }
        } else if cur.is_keyword("data") {
            match parse_data(&mut cur) {
                Ok(data) => out.data.push(data),
                Err(e) => return (out, Some(e)),
            }
        } else if cur.is_keyword("instr") {
            match parse_instr(&mut cur) {
                Ok(instr) => out.instrs.push(instr),
                Err(e) => return (out, Some(e)),
            }
        } else if cur.is_keyword("__cpp_inc__") {
            cur.bump();
            match cur.expect_string() {
                Ok(s) => out.cpp_includes.push(s),
                Err(e) => return (out, Some(e)),
            }
        } else {
            let line = cur.line();
            return (out, Some(ParseError::new(line, "unrecognized top-level token")));
        }
    }

    (out, None)
}

fn parse_target(cur: &mut Cursor, out: &mut TargetOutput) -> Result<(), ParseError> {
    cur.bump();
    cur.expect_punct(b'=')?;
    out.target = Some(cur.expect_string()?);
    Ok(())
}

fn parse_endian(cur: &mut Cursor, out: &mut TargetOutput) -> Result<(), ParseError> {
    cur.bump();
    cur.expect_punct(b'=')?;
    if cur.is_keyword("little") {
        cur.bump();
        out.endian = Some(Endian::Little);
    } else if cur.is_keyword("big") {
        cur.bump();
        out.endian = Some(Endian::Big);
    } else {
        return Err(ParseError::new(cur.line(), "expected 'little' or 'big'"));
    }
    Ok(())
}

fn parse_name_list(cur: &mut Cursor, out: &mut Vec<String>) -> Result<(), ParseError> {
    cur.bump();
    cur.expect_punct(b'[')?;
    while !cur.is_punct(b']') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated list, expected ']'"));
        }
        out.push(cur.expect_alpha()?);
    }
    cur.bump();
    Ok(())
}

/// `register NAME { width = N class = C parent P init { ... } }`.
/// Unknown fields inside the block are skipped (tolerant recovery
/// within nested blocks only; the top level is fail-fast).
fn parse_register(cur: &mut Cursor) -> Result<RegisterDecl, ParseError> {
    cur.bump();
    let mut reg = RegisterDecl { name: cur.expect_alpha()?, width_bits: 0, ..Default::default() };
    cur.expect_punct(b'{')?;
    while !cur.is_punct(b'}') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated register block"));
        }
        if cur.is_keyword("width") {
            cur.bump();
            cur.expect_punct(b'=')?;
            reg.width_bits = cur.expect_int()? as u32;
        } else if cur.is_keyword("class") {
            cur.bump();
            cur.expect_punct(b'=')?;
            reg.class = Some(cur.expect_alpha()?);
        } else if cur.is_keyword("parent") {
            cur.bump();
            reg.parent = Some(cur.expect_alpha()?);
        } else if cur.is_keyword("init") {
            cur.bump();
            reg.init = Some(skip_opaque_block(cur)?);
        } else {
            cur.bump();
        }
    }
    cur.bump();
    Ok(reg)
}

/// Consumes a balanced `{ ... }` block without interpreting its
/// contents, returning the raw concatenated source text inside it.
fn skip_opaque_block(cur: &mut Cursor) -> Result<String, ParseError> {
    cur.expect_punct(b'{')?;
    let start_tok = cur.current().map(|t| t.start);
    let mut depth = 1usize;
    let mut end_tok = start_tok;
    while depth > 0 {
        let tok = cur.bump().ok_or_else(|| ParseError::new(cur.line(), "unterminated init block"))?;
        match tok.kind {
            TokenKind::Punct(b'{') => depth += 1,
            TokenKind::Punct(b'}') => {
                depth -= 1;
                if depth == 0 {
                    end_tok = Some(tok.start);
                }
            }
            _ => {}
        }
    }
    match (start_tok, end_tok) {
        (Some(s), Some(e)) if e >= s => Ok(String::from_utf8_lossy(&cur.source[s..e]).into_owned()),
        _ => Ok(String::new()),
    }
}

/// `data NAME { bit f = 0  bit<4> g = 0 }`.
fn parse_data(cur: &mut Cursor) -> Result<DataDecl, ParseError> {
    cur.bump();
    let mut data = DataDecl { name: cur.expect_alpha()?, fields: Vec::new() };
    cur.expect_punct(b'{')?;
    while !cur.is_punct(b'}') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated data block"));
        }
        if cur.is_keyword("bit") {
            cur.bump();
            let mut width_bits = 1;
            if cur.is_punct(b'<') {
                cur.bump();
                width_bits = cur.expect_int()? as u32;
                cur.expect_punct(b'>')?;
            }
            let name = cur.expect_alpha()?;
            let mut default = None;
            if cur.is_punct(b'=') {
                cur.bump();
                default = Some(cur.expect_int()?);
            }
            data.fields.push(DataFieldDecl { name, width_bits, default });
        } else {
            cur.bump();
        }
    }
    cur.bump();
    Ok(data)
}

/// `instr NAME(OPERANDS) { result = B  clobber = [ B, ... ]  format = "..." (formatees) }`.
fn parse_instr(cur: &mut Cursor) -> Result<InstrDecl, ParseError> {
    cur.bump();
    let mut instr = InstrDecl { name: cur.expect_alpha()?, ..Default::default() };
    cur.expect_punct(b'(')?;
    while !cur.is_punct(b')') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated operand list"));
        }
        instr.operands.push(parse_operand(cur)?);
        if cur.is_punct(b',') {
            cur.bump();
        }
    }
    cur.bump();

    cur.expect_punct(b'{')?;
    while !cur.is_punct(b'}') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated instr block"));
        }
        if cur.is_keyword("result") {
            cur.bump();
            cur.expect_punct(b'=')?;
            instr.result = Some(cur.expect_alpha()?);
        } else if cur.is_keyword("clobber") {
            cur.bump();
            cur.expect_punct(b'=')?;
            cur.expect_punct(b'[')?;
            while !cur.is_punct(b']') {
                if cur.eof() {
                    return Err(ParseError::new(cur.line(), "unterminated clobber list"));
                }
                instr.clobbers.push(cur.expect_alpha()?);
                if cur.is_punct(b',') {
                    cur.bump();
                }
            }
            cur.bump();
        } else if cur.is_keyword("format") {
            cur.bump();
            cur.expect_punct(b'=')?;
            let fmt_string = cur.expect_string()?;
            let mut formatees = Vec::new();
            if cur.is_punct(b'(') {
                cur.bump();
                while !cur.is_punct(b')') {
                    if cur.eof() {
                        return Err(ParseError::new(cur.line(), "unterminated formatee list"));
                    }
                    let binding_name = cur.expect_alpha()?;
                    let mut accessor = None;
                    if cur.is_punct(b'.') {
                        cur.bump();
                        accessor = Some(cur.expect_alpha()?);
                    }
                    formatees.push(Formatee { binding_name, accessor });
                    if cur.is_punct(b',') {
                        cur.bump();
                    }
                }
                cur.bump();
            }
            instr.format = Some(FormatSpec { fmt_string, formatees });
        } else {
            cur.bump();
        }
    }
    cur.bump();
    Ok(instr)
}

fn parse_operand(cur: &mut Cursor) -> Result<OperandKind, ParseError> {
    if cur.is_keyword("imm") {
        cur.bump();
        cur.expect_punct(b'<')?;
        let width_bits = cur.expect_int()? as u32;
        cur.expect_punct(b'>')?;
        let name = cur.expect_alpha()?;
        return Ok(OperandKind::Immediate { width_bits, name });
    }
    if cur.is_keyword("str") {
        cur.bump();
        let name = cur.expect_alpha()?;
        return Ok(OperandKind::Str { name });
    }
    let first = cur.expect_alpha()?;
    if cur.is_alpha() {
        let binding_name = cur.expect_alpha()?;
        return Ok(OperandKind::RegClass { class: first, binding_name });
    }
    Ok(OperandKind::Register { name: first })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
target = "x86_64"
endian = little
regclass [ GPR64 GPR32 ]
register RAX { width = 64 class = GPR64 init { /* opaque block */ } }
register EAX { width = 32 class = GPR32 parent RAX }
data Flags { bit occupied = 0  bit<4> color = 0 }
extension [ avx avx2 ]
instr add(GPR64 dst, GPR64 src) {
    result = dst
    clobber = [ ]
    format = "add {}, {}" (dst.name, src.name)
}
__cpp_inc__ "header.hpp"
"#;

    #[test]
    fn parses_the_worked_example_with_no_error() {
        let (out, err) = parse(SAMPLE.as_bytes());
        assert!(err.is_none(), "unexpected parse error: {err:?}");
        assert_eq!(out.target.as_deref(), Some("x86_64"));
        assert_eq!(out.endian, Some(Endian::Little));
        assert_eq!(out.regclasses, vec!["GPR64", "GPR32"]);
        assert_eq!(out.registers.len(), 2);
        assert_eq!(out.registers[0].name, "RAX");
        assert_eq!(out.registers[0].width_bits, 64);
        assert_eq!(out.registers[1].parent.as_deref(), Some("RAX"));
        assert_eq!(out.data[0].fields[1].width_bits, 4);
        assert_eq!(out.extensions, vec!["avx", "avx2"]);
        assert_eq!(out.cpp_includes, vec!["header.hpp"]);

        let instr = &out.instrs[0];
        assert_eq!(instr.name, "add");
        assert_eq!(
            instr.operands,
            vec![
                OperandKind::RegClass { class: "GPR64".into(), binding_name: "dst".into() },
                OperandKind::RegClass { class: "GPR64".into(), binding_name: "src".into() },
            ]
        );
        assert_eq!(instr.result.as_deref(), Some("dst"));
        assert!(instr.clobbers.is_empty());
        let fmt = instr.format.as_ref().unwrap();
        assert_eq!(fmt.fmt_string, "add {}, {}");
        assert_eq!(fmt.formatees[0].binding_name, "dst");
        assert_eq!(fmt.formatees[0].accessor.as_deref(), Some("name"));
    }

    #[test]
    fn unrecognized_top_level_token_ends_the_file_with_partial_output() {
        let src = "target = \"x86_64\"\n!!!\nendian = little\n";
        let (out, err) = parse(src.as_bytes());
        assert_eq!(out.target.as_deref(), Some("x86_64"));
        assert!(out.endian.is_none(), "parsing should have stopped before 'endian'");
        assert!(err.is_some());
    }

    #[test]
    fn clobber_cap_is_not_enforced_here_but_list_parses() {
        let src = r#"
instr nop() {
    clobber = [ a b c d e f g ]
}
"#;
        let (out, err) = parse(src.as_bytes());
        assert!(err.is_none());
        assert_eq!(out.instrs[0].clobbers.len(), 7);
    }
}

//! IR text parser. The grammar is deliberately minimal: an optional
//! `triple = "..."` line, then per function a header
//! `func [align<N>] [local] TYPE @name(TYPE %arg, ...)`, block labels
//! `LBL:`, one instruction per mnemonic, and `end`.

use crate::block::{Block, BlockFlags};
use crate::error::ParseError;
use crate::frame::Frame;
use crate::function::{Arg, Function, FunctionFlags};
use crate::instr::{BinOp, Instruction};
use crate::types::TypeHandle;
use crate::value::Value;
use forge_lexer::{ir_keywords, lex, LexerConfig, Token, TokenKind};
use forge_target::TargetTriple;
use std::collections::HashMap;

struct Cursor<'a> {
    source: &'a [u8],
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
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

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Keyword && self.text(t) == word)
    }

    fn is_alpha(&self) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Alpha)
    }

    fn is_punct(&self, byte: u8) -> bool {
        matches!(self.current(), Some(t) if t.kind == TokenKind::Punct(byte))
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

    fn expect_int(&mut self) -> Result<u32, ParseError> {
        match self.current() {
            Some(t) if t.kind == TokenKind::IntegerLiteral => {
                let tok = self.bump().unwrap();
                self.text(&tok).parse::<u32>().map_err(|_| ParseError::new(tok.line, "malformed integer literal"))
            }
            _ => Err(ParseError::new(self.line(), "expected integer literal")),
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

    /// `%N` where `N` is a decimal integer: an SSA value reference.
    fn expect_value_id(&mut self) -> Result<u32, ParseError> {
        self.expect_punct(b'%')?;
        self.expect_int()
    }
}

struct FuncCtx {
    values: HashMap<u32, TypeHandle>,
}

impl FuncCtx {
    fn bind(&mut self, id: u32, ty: TypeHandle) -> Value {
        self.values.insert(id, ty);
        Value::new(id, ty)
    }

    fn reference(&self, id: u32, fallback: TypeHandle) -> Value {
        Value::new(id, self.values.get(&id).copied().unwrap_or(fallback))
    }
}

fn parse_type(cur: &mut Cursor, frame: &mut Frame) -> Result<TypeHandle, ParseError> {
    let mut ty = if cur.is_keyword("int") {
        cur.bump();
        cur.expect_punct(b'<')?;
        let width = cur.expect_int()?;
        cur.expect_punct(b'>')?;
        frame.types.get_integer(width)
    } else if cur.is_keyword("float") {
        cur.bump();
        frame.types.get_float(crate::types::FloatKind::F32)
    } else if cur.is_keyword("double") {
        cur.bump();
        frame.types.get_float(crate::types::FloatKind::F64)
    } else if cur.is_keyword("void") {
        cur.bump();
        frame.types.get_void()
    } else {
        return Err(ParseError::new(cur.line(), "expected a type"));
    };
    while cur.is_punct(b'*') {
        cur.bump();
        ty = frame.types.get_pointer(ty);
    }
    Ok(ty)
}

fn parse_function(cur: &mut Cursor, frame: &mut Frame) -> Result<(), ParseError> {
    cur.bump(); // "func"
    let mut flags = FunctionFlags::empty();
    let mut align = 1u32;
    if cur.is_keyword("align") {
        cur.bump();
        cur.expect_punct(b'<')?;
        align = cur.expect_int()?;
        cur.expect_punct(b'>')?;
        flags.insert(FunctionFlags::MANUAL_ALIGN);
    }
    if cur.is_keyword("local") {
        cur.bump();
        flags.insert(FunctionFlags::LOCAL);
    }

    let return_type = parse_type(cur, frame)?;
    cur.expect_punct(b'@')?;
    let name = cur.expect_alpha()?;

    let mut ctx = FuncCtx { values: HashMap::new() };
    let mut args = Vec::new();
    cur.expect_punct(b'(')?;
    while !cur.is_punct(b')') {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated parameter list"));
        }
        let ty = parse_type(cur, frame)?;
        cur.expect_punct(b'%')?;
        let arg_name = cur.expect_alpha()?;
        args.push(Arg { name: arg_name, ty });
        if cur.is_punct(b',') {
            cur.bump();
        }
    }
    cur.bump();

    let mut func = Function::new(name, return_type);
    func.args = args;
    func.align = align;
    func.flags = flags;

    while !cur.is_keyword("end") {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated function body, expected 'end'"));
        }
        let block_handle = parse_block(cur, frame, &mut ctx, return_type)?;
        func.blocks.push(block_handle);
    }
    cur.bump();

    frame.funcs.push(func);
    Ok(())
}

fn parse_block(
    cur: &mut Cursor,
    frame: &mut Frame,
    ctx: &mut FuncCtx,
    default_ty: TypeHandle,
) -> Result<crate::function::BlockHandle, ParseError> {
    let mut generate_label = false;
    let mut name = String::new();
    if cur.is_alpha() {
        let save = cur.pos;
        let candidate = cur.expect_alpha()?;
        if cur.is_punct(b':') {
            cur.bump();
            name = candidate;
            generate_label = true;
        } else {
            cur.pos = save;
        }
    }
    if name.is_empty() {
        name = format!("bb{}", frame.blocks.len());
    }

    let handle = frame.blocks.alloc(Block::new(name));
    if generate_label {
        frame.blocks.resolve_mut(handle).unwrap().flags.insert(BlockFlags::GENERATE_LABEL);
    }

    while !cur.is_keyword("end") && !starts_new_block(cur) {
        if cur.eof() {
            return Err(ParseError::new(cur.line(), "unterminated block"));
        }
        let instr = parse_instruction(cur, ctx, default_ty, handle)?;
        frame.blocks.resolve_mut(handle).unwrap().instructions.push(instr);
    }

    Ok(handle)
}

fn starts_new_block(cur: &mut Cursor) -> bool {
    if !cur.is_alpha() {
        return false;
    }
    let save = cur.pos;
    cur.bump();
    let is_label = cur.is_punct(b':');
    cur.pos = save;
    is_label
}

fn parse_instruction(
    cur: &mut Cursor,
    ctx: &mut FuncCtx,
    default_ty: TypeHandle,
    parent: crate::function::BlockHandle,
) -> Result<Instruction, ParseError> {
    let mnemonic = match cur.current() {
        Some(t) if t.kind == TokenKind::Keyword => cur.text(t).to_string(),
        _ => return Err(ParseError::new(cur.line(), "expected an instruction mnemonic")),
    };
    cur.bump();

    let instr = match mnemonic.as_str() {
        "alloc" => {
            let dest_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let amount_id = cur.expect_value_id()?;
            let dest = ctx.bind(dest_id, default_ty);
            let amount = ctx.reference(amount_id, default_ty);
            Instruction::Alloc { dest, amount, parent }
        }
        "add" | "sub" | "mul" | "div" => {
            let op = match mnemonic.as_str() {
                "add" => BinOp::Add,
                "sub" => BinOp::Sub,
                "mul" => BinOp::Mul,
                _ => BinOp::Div,
            };
            let dest_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let lhs_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let rhs_id = cur.expect_value_id()?;
            let lhs = ctx.reference(lhs_id, default_ty);
            let rhs = ctx.reference(rhs_id, default_ty);
            let dest = ctx.bind(dest_id, default_ty);
            Instruction::BinOp { op, dest, lhs, rhs, parent }
        }
        "mov" => {
            let dest_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let src_id = cur.expect_value_id()?;
            let src = ctx.reference(src_id, default_ty);
            let dest = ctx.bind(dest_id, default_ty);
            Instruction::Mov { dest, src, parent }
        }
        "load" => {
            let dest_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let addr_id = cur.expect_value_id()?;
            let addr = ctx.reference(addr_id, default_ty);
            let dest = ctx.bind(dest_id, default_ty);
            Instruction::Load { dest, addr, parent }
        }
        "store" => {
            let addr_id = cur.expect_value_id()?;
            cur.expect_punct(b',')?;
            let src_id = cur.expect_value_id()?;
            let addr = ctx.reference(addr_id, default_ty);
            let src = ctx.reference(src_id, default_ty);
            Instruction::Store { addr, src, parent }
        }
        "ret" => {
            if cur.is_punct(b'%') {
                let value_id = cur.expect_value_id()?;
                Instruction::Ret { value: Some(ctx.reference(value_id, default_ty)), parent }
            } else {
                Instruction::Ret { value: None, parent }
            }
        }
        other => return Err(ParseError::new(cur.line(), format!("unsupported instruction '{other}'"))),
    };
    Ok(instr)
}

/// Parse a full IR source buffer into a [`Frame`].
pub fn parse(source: &[u8]) -> Result<Frame, ParseError> {
    let cfg = LexerConfig::new(ir_keywords());
    let tokens = lex(source, &cfg).map_err(|e| ParseError::new(e.line, e.what))?;
    let mut cur = Cursor { source, tokens, pos: 0 };

    let mut triple = TargetTriple::parse("");
    if cur.is_keyword("triple") {
        cur.bump();
        cur.expect_punct(b'=')?;
        triple = TargetTriple::parse(&cur.expect_string()?);
    }

    let mut frame = Frame::new(triple);
    while !cur.eof() {
        if cur.is_keyword("func") {
            parse_function(&mut cur, &mut frame)?;
        } else {
            return Err(ParseError::new(cur.line(), "expected 'func'"));
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::print;

    const SAMPLE: &str = r#"
triple = "x86_64-linux-gnu"

func local int<32> @add(int<32> %a, int<32> %b)
entry:
	add %2, %0, %1
	ret %2
end
"#;

    #[test]
    fn round_trips_through_the_printer() {
        let frame = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(frame.funcs.len(), 1);
        let func = &frame.funcs[0];
        assert_eq!(func.name, "add");
        assert!(func.is_local());
        assert_eq!(func.blocks.len(), 1);

        let block = frame.block(func.blocks[0]).unwrap();
        assert_eq!(block.name, "entry");
        assert_eq!(block.instructions.len(), 2);

        let printed = print(&frame);
        assert!(printed.contains("func local int<32> @add(int<32> %a, int<32> %b)"));
        assert!(printed.contains("\tadd %2, %0, %1\n"));
        assert!(printed.contains("\tret %2\n"));
    }

    #[test]
    fn rejects_unsupported_mnemonics() {
        let src = "func void @f()\nentry:\n\tfrobnicate %0\nend\n";
        assert!(parse(src.as_bytes()).is_err());
    }
}

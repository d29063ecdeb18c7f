//! A minimal textual printer mirroring the parser's grammar, useful for
//! tests and for round-tripping a `Frame` back to source text. Grounded
//! in the source's `IRPrinter` (triple line, `func ... @name(...)`
//! header, `NAME:` block labels, `end` terminator).

use crate::block::BlockFlags;
use crate::frame::Frame;
use crate::instr::Instruction;
use crate::types::{FloatKind, Type, TypeArena};
use crate::value::Value;
use std::fmt::Write;

fn type_to_string(types: &TypeArena, handle: crate::types::TypeHandle) -> String {
    match types.resolve(handle) {
        Some(Type::Integer(w)) => format!("int<{w}>"),
        Some(Type::Float(FloatKind::F32)) => "float".to_string(),
        Some(Type::Float(FloatKind::F64)) => "double".to_string(),
        Some(Type::Void) => "void".to_string(),
        Some(Type::Pointer(inner)) => format!("{}*", type_to_string(types, *inner)),
        None => "<unresolved>".to_string(),
    }
}

fn value_ref(v: Value) -> String {
    format!("%{}", v.id)
}

fn print_instruction(out: &mut String, instr: &Instruction) {
    out.push('\t');
    match instr {
        Instruction::Alloc { dest, amount, .. } => {
            let _ = writeln!(out, "alloc {}, {}", value_ref(*dest), value_ref(*amount));
        }
        Instruction::BinOp { op, dest, lhs, rhs, .. } => {
            let _ = writeln!(out, "{} {}, {}, {}", op.mnemonic(), value_ref(*dest), value_ref(*lhs), value_ref(*rhs));
        }
        Instruction::Mov { dest, src, .. } => {
            let _ = writeln!(out, "mov {}, {}", value_ref(*dest), value_ref(*src));
        }
        Instruction::Load { dest, addr, .. } => {
            let _ = writeln!(out, "load {}, {}", value_ref(*dest), value_ref(*addr));
        }
        Instruction::Store { addr, src, .. } => {
            let _ = writeln!(out, "store {}, {}", value_ref(*addr), value_ref(*src));
        }
        Instruction::Ret { value: Some(v), .. } => {
            let _ = writeln!(out, "ret {}", value_ref(*v));
        }
        Instruction::Ret { value: None, .. } => {
            out.push_str("ret\n");
        }
    }
}

/// Print `frame` as IR source text.
pub fn print(frame: &Frame) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "triple = \"{}\"", triple_string(frame));
    out.push('\n');

    for func in &frame.funcs {
        out.push_str("func ");
        if func.has_manual_align() {
            let _ = write!(out, "align<{}> ", func.align);
        }
        if func.is_local() {
            out.push_str("local ");
        }
        let ret_ty = type_to_string(&frame.types, func.return_type);
        let _ = write!(out, "{ret_ty} @{}(", func.name);
        for (i, arg) in func.args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{} %{}", type_to_string(&frame.types, arg.ty), arg.name);
        }
        out.push_str(")\n");

        for &block_handle in &func.blocks {
            let Some(block) = frame.block(block_handle) else { continue };
            if block.flags.contains(BlockFlags::GENERATE_LABEL) {
                let _ = writeln!(out, "{}:", block.name);
            }
            for instr in &block.instructions {
                print_instruction(&mut out, instr);
            }
        }

        out.push_str("end\n\n");
    }

    out
}

fn triple_string(frame: &Frame) -> String {
    use forge_target::{Arch, Env, Os};
    let arch = match frame.triple.arch {
        Arch::X86_64 => "x86_64",
        Arch::AArch64 => "aarch64",
        Arch::None => "",
    };
    let os = match frame.triple.os {
        Os::Linux => "linux",
        Os::Unknown => "unknown",
        Os::None => "",
    };
    let env = match frame.triple.env {
        Env::Gnu => "gnu",
        Env::None => "",
    };
    format!("{arch}-{os}-{env}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockFlags};
    use crate::function::{Arg, Function, FunctionFlags};
    use crate::instr::{BinOp, Instruction};
    use crate::value::Value;
    use forge_target::TargetTriple;

    #[test]
    fn prints_a_minimal_function() {
        let mut frame = Frame::new(TargetTriple::parse("x86_64-linux-gnu"));
        let i32_ty = frame.types.get_integer(32);

        let a = Value::new(0, i32_ty);
        let b = Value::new(1, i32_ty);
        let dest = Value::new(2, i32_ty);

        let block_handle = frame.blocks.alloc(Block::new("entry"));
        {
            let entry = frame.blocks.resolve_mut(block_handle).unwrap();
            entry.flags.insert(BlockFlags::GENERATE_LABEL);
            entry.instructions.push(Instruction::BinOp { op: BinOp::Add, dest, lhs: a, rhs: b, parent: block_handle });
            entry.instructions.push(Instruction::Ret { value: Some(dest), parent: block_handle });
        }

        let mut func = Function::new("add", i32_ty);
        func.args.push(Arg { name: "a".to_string(), ty: i32_ty });
        func.args.push(Arg { name: "b".to_string(), ty: i32_ty });
        func.flags.insert(FunctionFlags::LOCAL);
        func.blocks.push(block_handle);
        frame.funcs.push(func);

        let text = print(&frame);
        assert!(text.starts_with("triple = \"x86_64-linux-gnu\"\n"));
        assert!(text.contains("func local int<32> @add(int<32> %a, int<32> %b)\n"));
        assert!(text.contains("entry:\n"));
        assert!(text.contains("\tadd %2, %0, %1\n"));
        assert!(text.contains("\tret %2\n"));
        assert!(text.ends_with("end\n\n"));
    }
}

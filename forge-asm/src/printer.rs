//! Target-aware assembly printing: given a [`LoweredOutput`] and the
//! original [`Frame`] it was lowered from, produce GNU-AS-flavored
//! textual assembly on a caller-supplied stream, plus ELF
//! CFI/section-type directives for ELF targets.

use std::io::Write;

use forge_ir::Frame;
use forge_select::{BoundOperand, LoweredOutput, TargetInstruction};
use forge_target::{FileFormat, TargetModel};

use crate::error::{AsmError, AsmResult};
use crate::syntax::Syntax;

/// Whether printing ran to completion or was cut short by the caller's
/// cancellation token, in which case the output is a valid partial
/// prefix rather than a complete file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Print every function in `output` to `out`, in order.
///
/// `frame` must be the same frame `output` was lowered from: each
/// [`forge_select::LoweredFunction::original_ref`] is looked up by name
/// against `frame.funcs` to recover the `LOCAL`/`MANUAL_ALIGN` flags
/// and alignment that live on the *original* function rather than the
/// lowered one. `cancelled` is polled between functions and between
/// blocks.
pub fn print(
    frame: &Frame,
    output: &LoweredOutput,
    model: &TargetModel,
    syntax: &dyn Syntax,
    out: &mut dyn Write,
) -> AsmResult<Outcome> {
    print_cancellable(frame, output, model, syntax, out, &|| false)
}

/// As [`print`], but polls `cancelled` at safe points: between functions
/// and between blocks.
pub fn print_cancellable(
    frame: &Frame,
    output: &LoweredOutput,
    model: &TargetModel,
    syntax: &dyn Syntax,
    out: &mut dyn Write,
    cancelled: &dyn Fn() -> bool,
) -> AsmResult<Outcome> {
    if let Some(prologue) = syntax.section_prologue(output.triple.file_format) {
        out.write_all(prologue.as_bytes())?;
    }

    for lowered_func in &output.funcs {
        if cancelled() {
            log::debug!("forge-asm: cancelled before function '{}'", lowered_func.original_ref);
            return Ok(Outcome::Cancelled);
        }
        let original = frame
            .funcs
            .iter()
            .find(|f| f.name == lowered_func.original_ref)
            .ok_or_else(|| AsmError::writer(format!("no original function named '{}'", lowered_func.original_ref)))?;

        log::trace!("forge-asm: printing function '{}'", original.name);
        print_function(frame, original, lowered_func, model, output.triple.file_format, syntax, out, cancelled)?;
    }

    Ok(Outcome::Completed)
}

#[allow(clippy::too_many_arguments)]
fn print_function(
    frame: &Frame,
    original: &forge_ir::Function,
    lowered: &forge_select::LoweredFunction,
    model: &TargetModel,
    file_format: FileFormat,
    syntax: &dyn Syntax,
    out: &mut dyn Write,
    cancelled: &dyn Fn() -> bool,
) -> AsmResult<()> {
    let name = &original.name;

    if !original.is_local() {
        writeln!(out, "\t.globl {name}")?;
    }

    let align_power = if original.has_manual_align() { original.align } else { 4 };
    writeln!(out, "\t.p2align {align_power}")?;

    if file_format == FileFormat::Elf {
        writeln!(out, "\t.type {name},@function")?;
    }

    writeln!(out, "{name}:")?;
    writeln!(out, "\t.cfi_startproc")?;

    for lowered_block in &lowered.blocks {
        if cancelled() {
            log::debug!("forge-asm: cancelled mid-function '{name}'");
            break;
        }
        let block = frame
            .block(lowered_block.original_ref)
            .ok_or_else(|| AsmError::writer(format!("function '{name}' references a destroyed block handle")))?;
        if block.flags.contains(forge_ir::BlockFlags::GENERATE_LABEL) {
            writeln!(out, "{}:", block.name)?;
        }
        for instr in &lowered_block.instructions {
            let text = emit_instruction(instr, model, syntax)?;
            writeln!(out, "\t{text}")?;
        }
    }

    writeln!(out, ".Lfunc_{name}_end:")?;
    writeln!(out, "\t.size {name}, .Lfunc_{name}_end-{name}")?;
    writeln!(out, "\t.cfi_endproc")?;
    writeln!(out)?;

    Ok(())
}

/// Render one lowered target instruction by looking up its template in
/// `model` and filling its format string's `{}` placeholders, in
/// declaration order, from the instruction's bound operands.
pub fn emit_instruction(instr: &TargetInstruction, model: &TargetModel, syntax: &dyn Syntax) -> AsmResult<String> {
    let template = model
        .instruction(&instr.template_name)
        .ok_or_else(|| AsmError::writer(format!("no target instruction template named '{}'", instr.template_name)))?;

    match &template.format {
        Some(fmt) => render_format(&fmt.fmt_string, &fmt.formatees, &instr.operands, syntax),
        None => Ok(instr.template_name.clone()),
    }
}

fn render_format(
    fmt_string: &str,
    formatees: &[forge_target::ResolvedFormatee],
    operands: &[BoundOperand],
    syntax: &dyn Syntax,
) -> AsmResult<String> {
    let mut result = String::with_capacity(fmt_string.len());
    let mut rest = fmt_string;
    for formatee in formatees {
        let Some(pos) = rest.find("{}") else {
            return Err(AsmError::writer(format!(
                "format string '{fmt_string}' has fewer '{{}}' placeholders than formatees"
            )));
        };
        result.push_str(&rest[..pos]);
        let operand = operands
            .get(formatee.operand_index)
            .ok_or_else(|| AsmError::writer("formatee references an operand index out of bounds"))?;
        result.push_str(&render_operand(operand, syntax));
        rest = &rest[pos + 2..];
    }
    result.push_str(rest);
    Ok(result)
}

/// Render a single bound operand. The TDL grammar's only documented
/// field accessor is `.name`, which is exactly the textual
/// representation already produced here, so accessors do not change
/// rendering today; they are preserved on `ResolvedFormatee` for
/// a richer target description to use.
fn render_operand(operand: &BoundOperand, syntax: &dyn Syntax) -> String {
    match operand {
        BoundOperand::Register(name) => syntax.register(name),
        BoundOperand::Immediate(value) => syntax.immediate(*value),
        BoundOperand::Str(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::GnuAs;
    use forge_ir::{Block, BlockFlags, Frame, Function, FunctionFlags};
    use forge_target::{Arch, TargetTriple};

    fn x86_model() -> TargetModel {
        let src = r#"
regclass [ GPR32 ]
register EAX { width = 32 class = GPR32 }
"#;
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        forge_target::build(&output).unwrap()
    }

    #[test]
    fn global_function_prologue_and_epilogue_match_expected_directives() {
        let model = x86_model();
        let triple = TargetTriple::parse("x86_64-linux-gnu");
        let mut frame = Frame::new(triple);
        let void = frame.types.get_void();

        let block_handle = frame.blocks.alloc(Block::new("entry"));

        let mut func = Function::new("main", void);
        func.blocks.push(block_handle);
        frame.funcs.push(func);

        let lowered = LoweredOutput {
            triple,
            funcs: vec![forge_select::LoweredFunction {
                original_ref: "main".to_string(),
                blocks: vec![forge_select::LoweredBlock { original_ref: block_handle, instructions: vec![] }],
            }],
        };

        let syntax = GnuAs::new(Arch::X86_64);
        let mut out = Vec::new();
        let outcome = print(&frame, &lowered, &model, &syntax, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Completed);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(
            "\t.text\n\t.globl main\n\t.p2align 4\n\t.type main,@function\nmain:\n\t.cfi_startproc\n"
        ));
        assert!(text.ends_with(".Lfunc_main_end:\n\t.size main, .Lfunc_main_end-main\n\t.cfi_endproc\n\n"));
    }

    #[test]
    fn format_string_fills_placeholders_in_formatee_order() {
        let src = r#"
regclass [ GPR32 ]
register EAX { width = 32 class = GPR32 }
register EBX { width = 32 class = GPR32 }
instr add(GPR32 dst, GPR32 src) {
    result = dst
    format = "add {}, {}" (src.name, dst.name)
}
"#;
        let (parsed, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none());
        let model = forge_target::build(&parsed).unwrap();
        let syntax = GnuAs::new(Arch::X86_64);

        let instr = TargetInstruction {
            id: 0,
            template_name: "add".to_string(),
            result: Some("EAX".to_string()),
            clobbers: smallvec::smallvec![],
            operands: vec![BoundOperand::Register("EAX".to_string()), BoundOperand::Register("EBX".to_string())],
        };
        let text = emit_instruction(&instr, &model, &syntax).unwrap();
        assert_eq!(text, "add %ebx, %eax");
    }

    #[test]
    fn cancellation_yields_partial_output() {
        use std::cell::Cell;

        let model = x86_model();
        let triple = TargetTriple::parse("x86_64-linux-gnu");
        let mut frame = Frame::new(triple);
        let void = frame.types.get_void();
        let mut f1 = Function::new("f1", void);
        f1.flags.insert(FunctionFlags::LOCAL);
        frame.funcs.push(f1);
        let mut f2 = Function::new("f2", void);
        f2.flags.insert(FunctionFlags::LOCAL);
        frame.funcs.push(f2);

        let lowered = LoweredOutput {
            triple,
            funcs: vec![
                forge_select::LoweredFunction { original_ref: "f1".to_string(), blocks: vec![] },
                forge_select::LoweredFunction { original_ref: "f2".to_string(), blocks: vec![] },
            ],
        };

        let syntax = GnuAs::new(Arch::X86_64);
        let mut out = Vec::new();
        let seen = Cell::new(0usize);
        let outcome = print_cancellable(&frame, &lowered, &model, &syntax, &mut out, &|| {
            seen.set(seen.get() + 1);
            seen.get() > 1
        })
        .unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("f1:"));
        assert!(!text.contains("f2:"));
    }
}

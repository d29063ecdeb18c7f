//! The two library entry points a driver uses: source text in,
//! assembly text or an object file's bytes out. A consuming driver
//! links against this library rather than shelling out to a binary.

use forge_asm::GnuAs;
use forge_select::LoweringError;
use forge_target::Arch;

use crate::config::PipelineOptions;
use crate::error::CompileResult;

/// Everything `compile_to_assembly` produces: the printed text, any
/// per-function lowering errors collected along the way (functions that
/// failed to lower are dropped, but the rest are still printed), and
/// whether printing ran to completion or was cut short by cancellation.
#[derive(Debug, Clone)]
pub struct AssemblyOutput {
    pub text: String,
    pub lowering_errors: Vec<LoweringError>,
    pub outcome: forge_asm::Outcome,
}

/// Parse a target description and an IR module, lower the IR against
/// the resulting target model, and print GNU-AS-flavored assembly.
///
/// Lowering errors are per-function and recoverable: a function that
/// fails to lower is dropped from the output and its error is reported
/// in [`AssemblyOutput::lowering_errors`], but functions that did lower
/// are still printed.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile_to_assembly(
    ir_source: &[u8],
    tdl_source: &[u8],
    options: &PipelineOptions,
) -> CompileResult<AssemblyOutput> {
    let (tdl_output, tdl_err) = forge_tdl::parse(tdl_source);
    if let Some(err) = tdl_err {
        return Err(err.into());
    }
    let model = forge_target::build(&tdl_output)?;

    let frame = forge_ir::parse(ir_source)?;

    let (lowered, lowering_errors) = forge_select::lower(&frame, &model);
    for err in &lowering_errors {
        log::warn!("forge: function '{}' did not lower: {err}", err.function_name);
    }

    let syntax = GnuAs::new(frame.triple.arch);
    let mut buf: Vec<u8> = Vec::new();
    let outcome = forge_asm::print_cancellable(&frame, &lowered, &model, &syntax, &mut buf, &|| {
        options.cancel.is_cancelled()
    })?;

    let text = String::from_utf8(buf)
        .map_err(|e| forge_asm::AsmError::writer(format!("printer produced invalid UTF-8: {e}")))?;

    Ok(AssemblyOutput { text, lowering_errors, outcome })
}

/// Render a [`forge_target::Arch`] through the one concrete syntax this
/// crate ships, GNU AS: a small convenience so drivers that already
/// have a triple in hand don't need to depend
/// on `forge-asm` directly just to construct a [`GnuAs`].
pub fn gnu_as_syntax(arch: Arch) -> GnuAs {
    GnuAs::new(arch)
}

/// Serialize a set of section blobs and an optional program header
/// table into ELF object bytes. This is a thin pass-through to
/// [`forge_obj::ObjectWriter`]; the facade adds no
/// behavior beyond unifying the error type.
pub fn write_object(
    writer: &forge_obj::ObjectWriter,
    sections: &[forge_obj::SectionDef],
    program_headers: &[forge_obj::ProgramHeaderDef],
) -> CompileResult<Vec<u8>> {
    Ok(writer.write_object(sections, program_headers)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TDL_SRC: &str = r#"
regclass [ GPR32 ]
register EAX { width = 32 class = GPR32 }
register EBX { width = 32 class = GPR32 }
instr add(GPR32 dst, GPR32 lhs, GPR32 rhs) {
    result = dst
    format = "add {}, {}" (lhs.name, rhs.name)
}
instr ret(GPR32 value) {
    format = "ret {}" (value.name)
}
"#;

    const IR_SRC: &str = r#"
triple = "x86_64-linux-gnu"

func int<32> @add(int<32> %a, int<32> %b)
entry:
	add %2, %0, %1
	ret %2
end
"#;

    #[test]
    fn full_pipeline_parses_lowers_and_prints() {
        let options = PipelineOptions::new();
        let result = compile_to_assembly(IR_SRC.as_bytes(), TDL_SRC.as_bytes(), &options).unwrap();
        assert!(result.lowering_errors.is_empty(), "{:?}", result.lowering_errors);
        assert_eq!(result.outcome, forge_asm::Outcome::Completed);
        assert!(result.text.contains(".globl add"));
        assert!(result.text.contains("add "));
        assert!(result.text.contains("ret "));
    }

    #[test]
    fn cancellation_before_any_function_yields_an_empty_partial_result() {
        let options = PipelineOptions::new();
        options.cancel.cancel();
        let result = compile_to_assembly(IR_SRC.as_bytes(), TDL_SRC.as_bytes(), &options).unwrap();
        assert_eq!(result.outcome, forge_asm::Outcome::Cancelled);
    }

    #[test]
    fn malformed_tdl_source_is_a_compile_error() {
        let options = PipelineOptions::new();
        let err = compile_to_assembly(IR_SRC.as_bytes(), b"register {{{", &options).unwrap_err();
        assert!(matches!(err, crate::error::CompileError::Tdl(_)));
    }

    #[test]
    fn missing_template_collects_a_lowering_error_but_still_succeeds() {
        let options = PipelineOptions::new();
        let ir = r#"
triple = "x86_64-linux-gnu"

func local int<32> @unmapped(int<32> %a)
entry:
	mov %1, %0
	ret %1
end
"#;
        let result = compile_to_assembly(ir.as_bytes(), TDL_SRC.as_bytes(), &options).unwrap();
        assert_eq!(result.lowering_errors.len(), 1);
    }
}

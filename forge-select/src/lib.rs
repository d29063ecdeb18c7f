//! Instruction selection and lowering: turns an IR `Frame` plus a
//! `TargetModel` into a `LoweredOutput`.

mod error;
mod output;
mod selector;

pub use error::LoweringError;
pub use output::{BoundOperand, LoweredBlock, LoweredFunction, LoweredOutput, RegisterRef, TargetInstruction};
pub use selector::lower;

#[cfg(test)]
mod tests {
    use super::*;
    use forge_ir::{BinOp, Block, BlockFlags, Frame, Function, FunctionFlags, Instruction, Value};
    use forge_target::TargetTriple;

    fn x86_model() -> forge_target::TargetModel {
        let src = r#"
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
        let (output, err) = forge_tdl::parse(src.as_bytes());
        assert!(err.is_none(), "{err:?}");
        forge_target::build(&output).unwrap()
    }

    #[test]
    fn lowers_a_binop_and_a_return() {
        let model = x86_model();
        let mut frame = Frame::new(TargetTriple::parse("x86_64-linux-gnu"));
        let i32_ty = frame.types.get_integer(32);

        let a = Value::new(0, i32_ty);
        let b = Value::new(1, i32_ty);
        let dest = Value::new(2, i32_ty);

        let block_handle = frame.blocks.alloc(Block::new("entry"));
        {
            let block = frame.blocks.resolve_mut(block_handle).unwrap();
            block.flags.insert(BlockFlags::GENERATE_LABEL);
            block.instructions.push(Instruction::BinOp { op: BinOp::Add, dest, lhs: a, rhs: b, parent: block_handle });
            block.instructions.push(Instruction::Ret { value: Some(dest), parent: block_handle });
        }

        let mut func = Function::new("add", i32_ty);
        func.flags.insert(FunctionFlags::LOCAL);
        func.blocks.push(block_handle);
        frame.funcs.push(func);

        let (lowered, errors) = lower(&frame, &model);
        assert!(errors.is_empty(), "unexpected lowering errors: {errors:?}");
        assert_eq!(lowered.funcs.len(), 1);
        let block = &lowered.funcs[0].blocks[0];
        assert_eq!(block.instructions.len(), 2);
        assert_eq!(block.instructions[0].template_name, "add");
        assert!(block.instructions[0].result.is_some());
    }

    #[test]
    fn missing_template_is_a_recoverable_lowering_error() {
        let model = forge_target::TargetModel::default();
        let mut frame = Frame::new(TargetTriple::parse("x86_64-linux-gnu"));
        let i32_ty = frame.types.get_integer(32);
        let v = Value::new(0, i32_ty);
        let block_handle = frame.blocks.alloc(Block::new("entry"));
        frame.blocks.resolve_mut(block_handle).unwrap().instructions.push(Instruction::Ret {
            value: Some(v),
            parent: block_handle,
        });
        let mut func = Function::new("f", i32_ty);
        func.blocks.push(block_handle);
        frame.funcs.push(func);

        let (lowered, errors) = lower(&frame, &model);
        assert!(lowered.funcs.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].function_name, "f");
    }
}

//! Pattern-match-on-`(opcode, operand type kinds)` instruction
//! selection. A target instruction template is looked up by the IR
//! opcode's mnemonic; operand slots of kind `RegClass`
//! are bound to the narrowest register in that class whose width fits
//! the IR value's type, preferring narrower registers on ties.

use crate::error::LoweringError;
use crate::output::{BoundOperand, LoweredBlock, LoweredFunction, LoweredOutput, TargetInstruction};
use forge_ir::{BinOp, Frame, Function, Instruction, Type};
use forge_tdl::OperandKind;
use forge_target::{Register, TargetModel};

fn opcode_mnemonic(instr: &Instruction) -> &'static str {
    match instr {
        Instruction::Alloc { .. } => "alloc",
        Instruction::BinOp { op: BinOp::Add, .. } => "add",
        Instruction::BinOp { op: BinOp::Sub, .. } => "sub",
        Instruction::BinOp { op: BinOp::Mul, .. } => "mul",
        Instruction::BinOp { op: BinOp::Div, .. } => "div",
        Instruction::Mov { .. } => "mov",
        Instruction::Load { .. } => "load",
        Instruction::Store { .. } => "store",
        Instruction::Ret { .. } => "ret",
    }
}

fn value_width_bits(frame: &Frame, value: forge_ir::Value) -> Result<u32, String> {
    match frame.types.resolve(value.ty) {
        Some(Type::Integer(w)) => Ok(*w),
        Some(other) => Err(format!("operand type {other:?} has no register-class lowering")),
        None => Err("operand has an unresolved type".to_string()),
    }
}

/// The narrowest register in `class` whose width is `>= min_width`,
/// breaking ties toward the smallest such width when more than one
/// register in the class fits the value.
fn pick_register<'a>(model: &'a TargetModel, class: &str, min_width: u32) -> Option<&'a Register> {
    model
        .registers_in_class(class)
        .into_iter()
        .filter(|r| r.width_bits >= min_width)
        .min_by_key(|r| r.width_bits)
}

/// The destination values an instruction reads, in template-operand
/// order, for the minimal op set this selector supports. Returns `(dest, operand
/// values to bind against RegClass slots in declaration order)`.
fn operand_values(instr: &Instruction) -> (Option<forge_ir::Value>, Vec<forge_ir::Value>) {
    match *instr {
        Instruction::Alloc { dest, amount, .. } => (Some(dest), vec![dest, amount]),
        Instruction::BinOp { dest, lhs, rhs, .. } => (Some(dest), vec![dest, lhs, rhs]),
        Instruction::Mov { dest, src, .. } => (Some(dest), vec![dest, src]),
        Instruction::Load { dest, addr, .. } => (Some(dest), vec![dest, addr]),
        Instruction::Store { addr, src, .. } => (None, vec![addr, src]),
        Instruction::Ret { value, .. } => (None, value.into_iter().collect()),
    }
}

fn select_instruction(
    frame: &Frame,
    instr: &Instruction,
    model: &TargetModel,
    id: usize,
) -> Result<TargetInstruction, String> {
    let mnemonic = opcode_mnemonic(instr);
    let template = model
        .instruction(mnemonic)
        .ok_or_else(|| format!("no target instruction template named '{mnemonic}'"))?;

    let (dest, values) = operand_values(instr);
    if values.len() != template.operands.len() {
        return Err(format!(
            "template '{mnemonic}' expects {} operands, opcode supplies {}",
            template.operands.len(),
            values.len()
        ));
    }

    let mut bound = Vec::with_capacity(template.operands.len());
    let mut bound_registers: Vec<Option<String>> = Vec::with_capacity(template.operands.len());
    for (op_kind, value) in template.operands.iter().zip(values.iter()) {
        match op_kind {
            OperandKind::RegClass { class, .. } => {
                let width = value_width_bits(frame, *value)?;
                let reg = pick_register(model, class, width)
                    .ok_or_else(|| format!("no register in class '{class}' wide enough for a {width}-bit value"))?;
                bound.push(BoundOperand::Register(reg.name.clone()));
                bound_registers.push(Some(reg.name.clone()));
            }
            OperandKind::Register { name } => {
                bound.push(BoundOperand::Register(name.clone()));
                bound_registers.push(Some(name.clone()));
            }
            OperandKind::Immediate { .. } | OperandKind::Str { .. } => {
                return Err(format!(
                    "template '{mnemonic}' declares an operand kind this IR has no value source for"
                ));
            }
        }
    }

    let result = dest.and(template.result_operand_ref).and_then(|idx| bound_registers.get(idx).cloned().flatten());
    let clobbers: smallvec::SmallVec<[String; 6]> = template
        .clobbers
        .iter()
        .filter_map(|&idx| bound_registers.get(idx).cloned().flatten())
        .collect();
    if clobbers.len() > 6 {
        return Err("more than six clobbers bound".to_string());
    }

    Ok(TargetInstruction { id, template_name: mnemonic.to_string(), result, clobbers, operands: bound })
}

fn select_function(frame: &Frame, func: &Function, model: &TargetModel) -> Result<LoweredFunction, LoweringError> {
    let mut next_id = 0usize;
    let mut blocks = Vec::with_capacity(func.blocks.len());
    for &block_handle in &func.blocks {
        let block = frame.block(block_handle).ok_or_else(|| {
            LoweringError::new(func.name.clone(), "function references a destroyed block handle")
        })?;
        let mut instructions = Vec::with_capacity(block.instructions.len());
        for instr in &block.instructions {
            let lowered = select_instruction(frame, instr, model, next_id)
                .map_err(|what| LoweringError::new(func.name.clone(), what))?;
            next_id += 1;
            instructions.push(lowered);
        }
        blocks.push(LoweredBlock { original_ref: block_handle, instructions });
    }
    Ok(LoweredFunction { original_ref: func.name.clone(), blocks })
}

/// Lower every function in `frame` against `model`. Per-function
/// failures are reported and skipped; lowering continues with the
/// remaining functions.
pub fn lower(frame: &Frame, model: &TargetModel) -> (LoweredOutput, Vec<LoweringError>) {
    let mut funcs = Vec::new();
    let mut errors = Vec::new();
    for func in &frame.funcs {
        match select_function(frame, func, model) {
            Ok(lowered) => funcs.push(lowered),
            Err(e) => errors.push(e),
        }
    }
    (LoweredOutput { triple: frame.triple, funcs }, errors)
}

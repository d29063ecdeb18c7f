use forge_ir::BlockHandle;
use forge_target::TargetTriple;
use smallvec::SmallVec;

/// A concrete register chosen during lowering, named after the target
/// model register it refers to.
pub type RegisterRef = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundOperand {
    Register(RegisterRef),
    Immediate(i64),
    Str(String),
}

/// A target instruction with every operand slot bound to a concrete
/// value, carrying enough information to print itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInstruction {
    pub id: usize,
    pub template_name: String,
    pub result: Option<RegisterRef>,
    pub clobbers: SmallVec<[RegisterRef; 6]>,
    pub operands: Vec<BoundOperand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredBlock {
    pub original_ref: BlockHandle,
    pub instructions: Vec<TargetInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredFunction {
    pub original_ref: String,
    pub blocks: Vec<LoweredBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredOutput {
    pub triple: TargetTriple,
    pub funcs: Vec<LoweredFunction>,
}

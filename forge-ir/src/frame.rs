use crate::block::Block;
use crate::function::{BlockArena, Function};
use crate::types::TypeArena;
use forge_target::TargetTriple;

/// A translation unit: an ordered list of functions plus the target
/// triple metadata, and the arenas their blocks and types live in.
pub struct Frame {
    pub triple: TargetTriple,
    pub funcs: Vec<Function>,
    pub types: TypeArena,
    pub blocks: BlockArena,
}

impl Frame {
    pub fn new(triple: TargetTriple) -> Self {
        Frame { triple, funcs: Vec::new(), types: TypeArena::new(), blocks: BlockArena::new() }
    }

    pub fn block(&self, handle: crate::function::BlockHandle) -> Option<&Block> {
        self.blocks.resolve(handle)
    }
}

use crate::block::{bitflags_like, Block};
use crate::types::TypeHandle;
use forge_arena::{Arena, Handle};

pub type BlockHandle = Handle<Block>;

bitflags_like! {
    /// `LOCAL` suppresses the global symbol directive in the printed
    /// assembly; `MANUAL_ALIGN` uses `align` instead of the target's
    /// default function alignment.
    pub struct FunctionFlags: u8 {
        const LOCAL = 0b0000_0001;
        const MANUAL_ALIGN = 0b0000_0010;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub ty: TypeHandle,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub return_type: TypeHandle,
    pub args: Vec<Arg>,
    pub blocks: Vec<BlockHandle>,
    pub align: u32,
    pub flags: FunctionFlags,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: TypeHandle) -> Self {
        Function {
            name: name.into(),
            return_type,
            args: Vec::new(),
            blocks: Vec::new(),
            align: 1,
            flags: FunctionFlags::empty(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.flags.contains(FunctionFlags::LOCAL)
    }

    pub fn has_manual_align(&self) -> bool {
        self.flags.contains(FunctionFlags::MANUAL_ALIGN)
    }
}

/// The arena blocks for a single `Frame` live in. A `Frame` owns one of
/// these; `Function::blocks` and `Block` values are resolved through it.
pub type BlockArena = Arena<Block>;

use crate::types::TypeHandle;

/// An SSA value: unique within its function, typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    pub id: u32,
    pub ty: TypeHandle,
}

impl Value {
    pub fn new(id: u32, ty: TypeHandle) -> Self {
        Value { id, ty }
    }
}

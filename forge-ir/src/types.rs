use forge_arena::{Arena, Handle};
use std::collections::HashMap;

pub type TypeHandle = Handle<Type>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

/// An interned IR type. Two types with the same structure always share
/// the same `TypeHandle` (structural equality implies handle equality);
/// `TypeArena` is the allocator that keeps that true.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Integer(u32),
    Float(FloatKind),
    Pointer(TypeHandle),
    Void,
}

/// Key used to deduplicate types before they are installed in the
/// backing arena. `TypeHandle` isn't `Hash`/`Eq` in a way that's useful
/// before the type it points to is known, so pointee types are keyed by
/// their own structural key, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StructKey {
    Integer(u32),
    Float(FloatKind),
    Pointer(Box<StructKey>),
    Void,
}

/// The type allocator: interns `Type` values behind `TypeHandle`s.
pub struct TypeArena {
    arena: Arena<Type>,
    interned: HashMap<StructKey, TypeHandle>,
    void: TypeHandle,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let void = arena.alloc(Type::Void);
        let mut interned = HashMap::new();
        interned.insert(StructKey::Void, void);
        TypeArena { arena, interned, void }
    }

    fn key_of(&self, ty: &Type) -> StructKey {
        match ty {
            Type::Integer(w) => StructKey::Integer(*w),
            Type::Float(k) => StructKey::Float(*k),
            Type::Void => StructKey::Void,
            Type::Pointer(pointee) => {
                let inner = self.resolve(*pointee).expect("pointee type must be live");
                StructKey::Pointer(Box::new(self.key_of(inner)))
            }
        }
    }

    fn intern(&mut self, ty: Type) -> TypeHandle {
        let key = self.key_of(&ty);
        if let Some(&handle) = self.interned.get(&key) {
            return handle;
        }
        let handle = self.arena.alloc(ty);
        self.interned.insert(key, handle);
        handle
    }

    pub fn get_integer(&mut self, width_bits: u32) -> TypeHandle {
        self.intern(Type::Integer(width_bits))
    }

    pub fn get_float(&mut self, kind: FloatKind) -> TypeHandle {
        self.intern(Type::Float(kind))
    }

    pub fn get_pointer(&mut self, pointee: TypeHandle) -> TypeHandle {
        self.intern(Type::Pointer(pointee))
    }

    pub fn get_void(&self) -> TypeHandle {
        self.void
    }

    pub fn resolve(&self, handle: TypeHandle) -> Option<&Type> {
        self.arena.resolve(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_implies_handle_equality() {
        let mut types = TypeArena::new();
        let a = types.get_integer(32);
        let b = types.get_integer(32);
        assert_eq!(a, b);
        let c = types.get_integer(64);
        assert_ne!(a, c);
    }

    #[test]
    fn pointer_interning_is_recursive() {
        let mut types = TypeArena::new();
        let i32_ty = types.get_integer(32);
        let p1 = types.get_pointer(i32_ty);
        let p2 = types.get_pointer(i32_ty);
        assert_eq!(p1, p2);
        let pp1 = types.get_pointer(p1);
        let pp2 = types.get_pointer(p2);
        assert_eq!(pp1, pp2);
    }

    #[test]
    fn void_is_singleton() {
        let types = TypeArena::new();
        assert_eq!(types.get_void(), types.get_void());
    }
}

//! A generational arena: a collection that owns many values of a single
//! type `T` and hands out small, copyable [`Handle`]s instead of references.
//!
//! Handles survive the arena's internal storage growing (the backing
//! `Vec` may reallocate and move; a handle only ever carries an index and
//! a generation, never a raw pointer) and are checked against a
//! generation counter so a handle into a destroyed slot resolves to
//! nothing rather than to whatever value was later allocated in its place.
//!
//! Each entity kind in `forge-ir` and `forge-tdl` (instructions, blocks,
//! functions, types, ...) gets its own `Arena<T>`, instantiated once per
//! entity kind rather than shared across kinds.

use std::collections::TryReserveError;
use std::fmt;
use std::marker::PhantomData;

/// A stable, copyable reference into an [`Arena<T>`].
///
/// A handle resolves to the same logical value for as long as that value
/// lives in the arena, regardless of how many other allocations happen
/// in between. `Handle::NULL` never resolves to anything; it is the
/// null-equivalent handle returned on allocation failure.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The null-equivalent handle. Never resolves.
    pub const NULL: Handle<T> = Handle { index: 0, generation: 0, _marker: PhantomData };

    /// True if this is the null-equivalent handle.
    ///
    /// Note this is a structural check, not a liveness check: a non-null
    /// handle into a destroyed slot is also dead, but `is_null` returns
    /// `false` for it. Use `Arena::resolve` to test liveness.
    pub fn is_null(&self) -> bool {
        self.generation == 0
    }

    fn new(index: u32, generation: u32) -> Self {
        debug_assert_ne!(generation, 0, "generation 0 is reserved for the null handle");
        Handle { index, generation, _marker: PhantomData }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle(#{}, gen {})", self.index, self.generation)
        }
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

/// An arena owning many `T` values, indexed by stable [`Handle<T>`]s.
///
/// Backing storage is a `Vec<Slot<T>>` that grows the way `Vec` always
/// grows (amortized doubling); that growth never invalidates a live
/// handle because handles never carry raw pointers.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Arena { slots: Vec::new(), free: Vec::new() }
    }

    /// Allocate `value` in the arena and return a stable handle to it.
    ///
    /// Returns `Handle::NULL` only if the backing storage could not grow
    /// to fit the new slot (out of memory); `value` is dropped in that
    /// case.
    pub fn alloc(&mut self, value: T) -> Handle<T> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            let generation = match *slot {
                Slot::Vacant { generation } => generation,
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            *slot = Slot::Occupied { generation, value };
            return Handle::new(index, generation);
        }

        if let Err(_e) = self.try_reserve_one() {
            log::warn!("forge-arena: allocation failed, backing store could not grow");
            drop(value);
            return Handle::NULL;
        }

        let index = self.slots.len() as u32;
        let generation = 1;
        self.slots.push(Slot::Occupied { generation, value });
        Handle::new(index, generation)
    }

    fn try_reserve_one(&mut self) -> Result<(), TryReserveError> {
        if self.slots.len() == self.slots.capacity() {
            self.slots.try_reserve(self.slots.capacity().max(4))?;
        }
        Ok(())
    }

    /// Resolve a handle to a shared reference.
    ///
    /// Returns `None` if the handle is null, out of range, or points at a
    /// slot that has since been destroyed and not yet reused with the
    /// same generation.
    pub fn resolve(&self, handle: Handle<T>) -> Option<&T> {
        if handle.is_null() {
            return None;
        }
        match self.slots.get(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Resolve a handle to a mutable reference.
    pub fn resolve_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.is_null() {
            return None;
        }
        match self.slots.get_mut(handle.index as usize)? {
            Slot::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Destroy the value behind `handle`, dropping it and invalidating
    /// every handle that currently points at that slot. The slot's index
    /// is recycled by a later `alloc` call, but with a bumped generation
    /// so stale handles keep failing to resolve.
    ///
    /// A no-op if the handle is already dead.
    pub fn destroy(&mut self, handle: Handle<T>) {
        if handle.is_null() {
            return;
        }
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        let is_live = matches!(slot, Slot::Occupied { generation, .. } if *generation == handle.generation);
        if !is_live {
            return;
        }
        *slot = Slot::Vacant { generation: handle.generation.wrapping_add(1).max(1) };
        self.free.push(handle.index);
    }

    /// True if `handle` currently resolves to a live value.
    pub fn is_live(&self, handle: Handle<T>) -> bool {
        self.resolve(handle).is_some()
    }

    /// Number of slots ever allocated, live or destroyed. Not the live
    /// element count; see [`Arena::len`] for that.
    pub fn capacity_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently live values.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every live `(Handle<T>, &T)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| match slot {
            Slot::Occupied { generation, value } => Some((Handle::new(i as u32, *generation), value)),
            Slot::Vacant { .. } => None,
        })
    }
}

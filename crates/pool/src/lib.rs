//! Append-only Slot Pool
//!
//! Indexed storage for pooled values whose index is an identity. Indices are
//! handed out sequentially and never reassigned: a slot can be retired, which
//! leaves an explicit empty marker behind, but retired slots are never
//! compacted and never given to another index.
//!
//! Values without a stable identity (document nodes) belong in the
//! free-list [`Arena`] instead, which recycles removed slots.

mod arena;

pub use arena::{Arena, Key};

/// State of a single slot.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot<T> {
    /// Never filled (a gap, or an index reserved but not yet filled).
    Vacant,
    /// Holds a live value.
    Occupied(T),
    /// Held a value once; emptied explicitly.
    Retired,
}

impl<T> Slot<T> {
    fn value(&self) -> Option<&T> {
        match self {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }

    fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    len: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Reserve the next index without filling it.
    pub fn reserve(&mut self) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot::Vacant);
        index
    }

    /// Fill slot `index`, growing the pool with vacant gaps if needed.
    ///
    /// Returns the previous value if the slot was occupied.
    pub fn insert(&mut self, index: usize, value: T) -> Option<T> {
        self.grow_to(index);
        let previous = std::mem::replace(&mut self.slots[index], Slot::Occupied(value));
        match previous {
            Slot::Occupied(old) => Some(old),
            _ => {
                self.len += 1;
                None
            }
        }
    }

    /// Mutable access to slot `index`, filling it with `init()` unless it is
    /// already occupied. Retired slots are filled again: the index keeps
    /// naming the same logical entry.
    pub fn get_or_insert_with(&mut self, index: usize, init: impl FnOnce() -> T) -> &mut T {
        self.grow_to(index);
        let slot = &mut self.slots[index];
        if !matches!(slot, Slot::Occupied(_)) {
            *slot = Slot::Occupied(init());
            self.len += 1;
        }
        match slot {
            Slot::Occupied(v) => v,
            _ => unreachable!("slot was filled above"),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)?.value()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index)?.value_mut()
    }

    /// Empty slot `index`, leaving the retired marker behind.
    ///
    /// Retiring a slot that holds no value is a no-op and returns `None`.
    pub fn retire(&mut self, index: usize) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Occupied(_)) {
            return None;
        }
        self.len -= 1;
        match std::mem::replace(slot, Slot::Retired) {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }

    /// Occupied slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.value().map(|v| (i, v)))
    }

    /// Occupied slots with an index strictly greater than `index`.
    pub fn iter_after(&self, index: usize) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.iter().skip_while(move |(i, _)| *i <= index)
    }

    fn grow_to(&mut self, index: usize) {
        while self.slots.len() <= index {
            self.slots.push(Slot::Vacant);
        }
    }
}

//! Arena-backed doubly-linked list with stable positional handles.
//!
//! Nodes live in a `Vec` of slots and link to each other by slot index.
//! Removed slots go onto a free list and are reused by later insertions.
//! Every slot carries a generation counter that is bumped when its node is
//! removed, so a [`Pos`] that outlived its element is recognised as stale
//! rather than silently pointing at whatever reuses the slot.
//!
//! Insertion and removal at a known [`Pos`] are O(1). A removal invalidates
//! only the handles to the removed element.

use std::fmt;
use std::iter::FusedIterator;

/// Handle to an element of a [`List`], or to its past-the-end position.
///
/// Handles are plain values: stepping and dereferencing go through the list
/// (`List::next`, `List::prev`, `List::get`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos(Option<Key>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    slot: usize,
    generation: u32,
}

impl Pos {
    /// The past-the-end position, shared by every list.
    pub const END: Self = Self(None);

    /// Whether this is the past-the-end position.
    pub const fn is_end(self) -> bool {
        self.0.is_none()
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
enum Entry<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

/// A doubly-linked, double-ended list.
#[derive(Clone)]
pub struct List<T> {
    slots: Vec<Slot<T>>,
    free: Option<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> List<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|slot| &self.node(slot).value)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.map(|slot| &self.node(slot).value)
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        let slot = self.head?;
        Some(&mut self.node_mut(slot).value)
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        let slot = self.tail?;
        Some(&mut self.node_mut(slot).value)
    }

    pub fn push_front(&mut self, value: T) {
        self.link_before(self.head, value);
    }

    pub fn push_back(&mut self, value: T) {
        self.link_before(None, value);
    }

    /// Remove and return the first element, or `None` if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let slot = self.head?;
        Some(self.unlink(slot).0)
    }

    /// Remove and return the last element, or `None` if the list is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        let slot = self.tail?;
        Some(self.unlink(slot).0)
    }

    /// Remove every element. All outstanding element handles become stale.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Position of the first element, or [`Pos::END`] when empty.
    pub fn begin(&self) -> Pos {
        self.pos_of(self.head)
    }

    /// The past-the-end position.
    pub const fn end(&self) -> Pos {
        Pos::END
    }

    /// Position following `pos`.
    ///
    /// Returns `None` when `pos` is past-the-end or stale.
    pub fn next(&self, pos: Pos) -> Option<Pos> {
        let slot = self.resolve(pos)?;
        Some(self.pos_of(self.node(slot).next))
    }

    /// Position preceding `pos`. The position before [`Pos::END`] is the last
    /// element.
    ///
    /// Returns `None` when `pos` is the first position or stale.
    pub fn prev(&self, pos: Pos) -> Option<Pos> {
        let prev = match pos.0 {
            None => self.tail,
            Some(_) => self.node(self.resolve(pos)?).prev,
        };
        prev.map(|slot| self.pos_of(Some(slot)))
    }

    /// Element at `pos`, or `None` at past-the-end or for a stale handle.
    pub fn get(&self, pos: Pos) -> Option<&T> {
        let slot = self.resolve(pos)?;
        Some(&self.node(slot).value)
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut T> {
        let slot = self.resolve(pos)?;
        Some(&mut self.node_mut(slot).value)
    }

    /// Insert `value` before `pos` and return the new element's position.
    /// Inserting before [`Pos::END`] appends.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is a stale handle.
    pub fn insert(&mut self, pos: Pos, value: T) -> Pos {
        let next = match pos.0 {
            None => None,
            Some(_) => {
                let slot = self.resolve(pos);
                assert!(slot.is_some(), "List::insert at a stale position");
                slot
            }
        };
        let slot = self.link_before(next, value);
        self.pos_of(Some(slot))
    }

    /// Remove the element at `pos`, returning it together with the position
    /// of the element that followed it.
    ///
    /// Returns `None` when `pos` is past-the-end or stale.
    pub fn remove(&mut self, pos: Pos) -> Option<(T, Pos)> {
        let slot = self.resolve(pos)?;
        let (value, next) = self.unlink(slot);
        Some((value, self.pos_of(next)))
    }

    /// Iterate front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    // --- Private helpers ---

    fn pos_of(&self, slot: Option<usize>) -> Pos {
        Pos(slot.map(|slot| Key {
            slot,
            generation: self.slots[slot].generation,
        }))
    }

    fn resolve(&self, pos: Pos) -> Option<usize> {
        let key = pos.0?;
        let slot = self.slots.get(key.slot)?;
        match slot.entry {
            Entry::Occupied(_) if slot.generation == key.generation => Some(key.slot),
            _ => None,
        }
    }

    // Slot indices reachable through links are always occupied.
    fn node(&self, slot: usize) -> &Node<T> {
        match &self.slots[slot].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => unreachable!("linked slot {slot} is vacant"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<T> {
        match &mut self.slots[slot].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => unreachable!("linked slot {slot} is vacant"),
        }
    }

    fn allocate(&mut self, node: Node<T>) -> usize {
        if let Some(slot) = self.free {
            if let Entry::Vacant { next_free } = self.slots[slot].entry {
                self.free = next_free;
            }
            self.slots[slot].entry = Entry::Occupied(node);
            slot
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: Entry::Occupied(node),
            });
            self.slots.len() - 1
        }
    }

    /// Link a new node in front of `next` (`None` = append).
    fn link_before(&mut self, next: Option<usize>, value: T) -> usize {
        let prev = match next {
            Some(next) => self.node(next).prev,
            None => self.tail,
        };
        let slot = self.allocate(Node { value, prev, next });
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(slot),
            None => self.head = Some(slot),
        }
        match next {
            Some(next) => self.node_mut(next).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.len += 1;
        slot
    }

    /// Unlink `slot`, free it, and return its value and successor.
    fn unlink(&mut self, slot: usize) -> (T, Option<usize>) {
        let vacant = Entry::Vacant {
            next_free: self.free,
        };
        let entry = std::mem::replace(&mut self.slots[slot].entry, vacant);
        let Entry::Occupied(node) = entry else {
            unreachable!("unlinking vacant slot {slot}");
        };
        self.slots[slot].generation = self.slots[slot].generation.wrapping_add(1);
        self.free = Some(slot);

        match node.prev {
            Some(prev) => self.node_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.node_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.len -= 1;
        (node.value, node.next)
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a [`List`].
pub struct Iter<'a, T> {
    list: &'a List<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.front?);
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.back?);
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

//! JSON document tree
//!
//! A [`Node`] is a cheap handle: a kind tag, a value span, an optional key
//! span and, for containers, a shared child list. Parsing borrows every
//! scalar from the input, so a parsed tree never copies text. Building a
//! tree through the `write*` family encodes values into the node's
//! [`Arena`](crate::memory::Arena) instead.
//!
//! Cloning a node aliases its child list and arena; mutations through one
//! handle are visible through every clone.

mod encode;
mod parser;
mod print;
mod write;

pub use encode::{Encode, Null, escape, escape_into, escaped_len, unescape};
pub use parser::{
    DepthTracker, ParseError, ParseErrorKind, ParseStats, Parser, parse, parse_prefix, try_parse,
};

use crate::{
    flags::{self, NodeFlags},
    memory::{Arena, ArenaSlice, SharedArena},
};
use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
    str::FromStr,
};

/// Kind of value a node holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Kind {
    #[default]
    Undefined,
    Null,
    Object,
    Array,
    String,
    Integer,
    Real,
    Bool,
}

impl Kind {
    /// Objects and arrays
    pub fn has_children(self) -> bool {
        matches!(self, Kind::Object | Kind::Array)
    }

    pub fn is_number(self) -> bool {
        matches!(self, Kind::Integer | Kind::Real)
    }

    /// Kinds whose value is a single run of text
    pub fn is_scalar(self) -> bool {
        !self.has_children() && self != Kind::Undefined
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Undefined => "undefined",
            Kind::Null => "null",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Real => "real",
            Kind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Bytes a node refers to
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Span<'a> {
    #[default]
    Empty,
    /// Borrowed from parse input or a static literal
    Borrowed(&'a [u8]),
    /// Written into arena memory
    Arena(ArenaSlice),
}

impl Span<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Span::Empty => &[],
            Span::Borrowed(bytes) => bytes,
            Span::Arena(slice) => slice.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

pub(crate) type ChildList<'a> = Rc<RefCell<Children<'a>>>;

/// Child list shared by every handle to one container
#[derive(Debug)]
pub struct Children<'a> {
    nodes: Vec<Node<'a>>,
    flags: NodeFlags,
}

impl<'a> Children<'a> {
    fn shared() -> ChildList<'a> {
        Rc::new(RefCell::new(Self {
            nodes: Vec::new(),
            flags: NodeFlags::SORTED,
        }))
    }

    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the list is currently ordered by key
    pub fn is_sorted(&self) -> bool {
        flags::is_set(self.flags, NodeFlags::SORTED)
    }

    fn set_sorted(&mut self, sorted: bool) {
        flags::set(&mut self.flags, NodeFlags::SORTED, sorted);
    }

    fn sort_by_key(&mut self) {
        // stable, so duplicate keys keep document order
        self.nodes.sort_by(|a, b| a.key_bytes().cmp(b.key_bytes()));
        self.set_sorted(true);
    }

    /// Append a keyed child, clearing the sorted flag if it lands out of order
    fn push_keyed(&mut self, node: Node<'a>) {
        if self
            .nodes
            .last()
            .is_some_and(|last| node.key_bytes() < last.key_bytes())
        {
            self.set_sorted(false);
        }
        self.nodes.push(node);
    }

    fn position(&self, key: &[u8]) -> Option<usize> {
        if self.is_sorted() {
            let index = self.nodes.partition_point(|n| n.key_bytes() < key);
            (self.nodes.get(index)?.key_bytes() == key).then_some(index)
        } else {
            self.nodes.iter().position(|n| n.key_bytes() == key)
        }
    }
}

impl Drop for Children<'_> {
    fn drop(&mut self) {
        // Flatten the subtree so deep documents cannot overflow the stack.
        let mut pending = std::mem::take(&mut self.nodes);
        while let Some(mut node) = pending.pop() {
            if let Some(list) = node.children.take()
                && let Ok(cell) = Rc::try_unwrap(list)
            {
                pending.append(&mut cell.into_inner().nodes);
            }
        }
    }
}

/// Handle to one value of a JSON document
#[derive(Clone)]
pub struct Node<'a> {
    kind: Kind,
    value: Span<'a>,
    key: Span<'a>,
    flags: NodeFlags,
    children: Option<ChildList<'a>>,
    arena: SharedArena,
}

impl Default for Node<'_> {
    /// Undefined node with a fresh arena over the default pool
    fn default() -> Self {
        Self::new(Arena::shared_default())
    }
}

impl<'a> Node<'a> {
    /// Undefined node writing into `arena`
    pub fn new(arena: SharedArena) -> Self {
        Self {
            kind: Kind::Undefined,
            value: Span::Empty,
            key: Span::Empty,
            flags: NodeFlags::empty(),
            children: None,
            arena,
        }
    }

    /// Empty object writing into `arena`
    pub fn object(arena: SharedArena) -> Self {
        let mut node = Self::new(arena);
        node.make_object();
        node
    }

    /// Empty array writing into `arena`
    pub fn array(arena: SharedArena) -> Self {
        let mut node = Self::new(arena);
        node.make_array();
        node
    }

    /// Undefined child sharing this node's arena
    fn sibling(&self) -> Self {
        Self::new(Rc::clone(&self.arena))
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }

    /// Value text; empty for containers
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    pub fn size(&self) -> usize {
        self.value.len()
    }

    pub fn span(&self) -> &Span<'a> {
        &self.value
    }

    pub fn has_key(&self) -> bool {
        flags::is_set(self.flags, NodeFlags::HAS_KEY)
    }

    /// Key text, when this node is a keyed child
    pub fn key(&self) -> Option<&[u8]> {
        self.has_key().then(|| self.key.as_bytes())
    }

    /// Key text, empty when the node has no key
    pub fn key_bytes(&self) -> &[u8] {
        self.key().unwrap_or_default()
    }

    /// Both nodes carry a key and the keys are byte-equal
    pub fn keys_equal(&self, other: &Node<'_>) -> bool {
        matches!((self.key(), other.key()), (Some(a), Some(b)) if a == b)
    }

    /// Whether the child list is known to be ordered by key
    pub fn sorted(&self) -> bool {
        self.children
            .as_ref()
            .is_some_and(|list| list.borrow().is_sorted())
    }

    pub fn is_undefined(&self) -> bool {
        self.kind == Kind::Undefined
    }

    pub fn is_null(&self) -> bool {
        self.kind == Kind::Null
    }

    /// Number of children; zero for scalars
    pub fn len(&self) -> usize {
        self.children.as_ref().map_or(0, |list| list.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the child list
    pub fn children(&self) -> Option<Ref<'_, [Node<'a>]>> {
        self.children
            .as_ref()
            .map(|list| Ref::map(list.borrow(), |c| c.nodes.as_slice()))
    }

    /// Failure text installed by a rejected [`parse`](Self::parse)
    pub fn diagnostic(&self) -> Option<&str> {
        if self.kind != Kind::Undefined || self.value.is_empty() {
            return None;
        }
        std::str::from_utf8(self.as_bytes()).ok()
    }

    // === Typed accessors ===

    fn integer<T: FromStr>(&self) -> Option<T> {
        if self.kind != Kind::Integer {
            return None;
        }
        std::str::from_utf8(self.as_bytes()).ok()?.parse().ok()
    }

    pub fn int8(&self) -> Option<i8> {
        self.integer()
    }

    pub fn uint8(&self) -> Option<u8> {
        self.integer()
    }

    pub fn int16(&self) -> Option<i16> {
        self.integer()
    }

    pub fn uint16(&self) -> Option<u16> {
        self.integer()
    }

    pub fn int32(&self) -> Option<i32> {
        self.integer()
    }

    pub fn uint32(&self) -> Option<u32> {
        self.integer()
    }

    pub fn int64(&self) -> Option<i64> {
        self.integer()
    }

    pub fn uint64(&self) -> Option<u64> {
        self.integer()
    }

    /// Integer or real value as `f64`
    pub fn real(&self) -> Option<f64> {
        if !self.kind.is_number() {
            return None;
        }
        std::str::from_utf8(self.as_bytes()).ok()?.parse().ok()
    }

    /// String value as stored, escapes included
    pub fn str(&self) -> Option<&str> {
        if self.kind != Kind::String {
            return None;
        }
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// String value with simple escapes decoded
    pub fn unescaped(&self) -> Option<String> {
        if self.kind != Kind::String {
            return None;
        }
        String::from_utf8(unescape(self.as_bytes())).ok()
    }

    pub fn boolean(&self) -> Option<bool> {
        if self.kind != Kind::Bool {
            return None;
        }
        Some(self.as_bytes() == b"true")
    }

    // === Lookup ===

    fn object_children(&self) -> Option<&ChildList<'a>> {
        if self.kind != Kind::Object {
            return None;
        }
        self.children.as_ref()
    }

    /// Sort this object's children if they are not known to be ordered
    fn ensure_sorted(list: &ChildList<'a>) {
        let mut children = list.borrow_mut();
        if !children.is_sorted() {
            children.sort_by_key();
        }
    }

    /// Sort every object in the tree by key
    pub fn sort_objects(&self) {
        let Some(root) = &self.children else {
            return;
        };
        let mut pending = vec![(Rc::clone(root), self.kind == Kind::Object)];
        while let Some((list, is_object)) = pending.pop() {
            let mut children = list.borrow_mut();
            if is_object && !children.is_sorted() {
                children.sort_by_key();
            }
            pending.extend(children.nodes.iter().filter_map(|child| {
                let grand = child.children.as_ref()?;
                Some((Rc::clone(grand), child.kind == Kind::Object))
            }));
        }
    }

    /// Child of an object by key; sorts the object first if needed
    pub fn get(&self, key: &str) -> Option<Node<'a>> {
        self.get_bytes(key.as_bytes())
    }

    /// Byte-exact variant of [`get`](Self::get)
    pub fn get_bytes(&self, key: &[u8]) -> Option<Node<'a>> {
        let list = self.object_children()?;
        Self::ensure_sorted(list);
        let children = list.borrow();
        let index = children.position(key)?;
        children.nodes.get(index).cloned()
    }

    /// Alias of [`get`](Self::get)
    pub fn find(&self, key: &str) -> Option<Node<'a>> {
        self.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Child by position, for objects and arrays alike
    pub fn at(&self, index: usize) -> Option<Node<'a>> {
        self.children.as_ref()?.borrow().nodes.get(index).cloned()
    }

    /// Mutable handle to an object's child
    ///
    /// # Panics
    ///
    /// The handle holds this node's child list mutably borrowed. Any other
    /// call on this node that reads or changes its children (`len`, `get`,
    /// `print`, `add`, ...) panics until the handle is dropped.
    pub fn get_mut(&self, key: &str) -> Option<RefMut<'_, Node<'a>>> {
        let list = self.object_children()?;
        Self::ensure_sorted(list);
        let index = list.borrow().position(key.as_bytes())?;
        RefMut::filter_map(list.borrow_mut(), |c| c.nodes.get_mut(index)).ok()
    }

    /// Mutable handle to a child by position
    ///
    /// # Panics
    ///
    /// The handle holds this node's child list mutably borrowed. Any other
    /// call on this node that reads or changes its children (`len`, `get`,
    /// `print`, `add`, ...) panics until the handle is dropped.
    pub fn at_mut(&self, index: usize) -> Option<RefMut<'_, Node<'a>>> {
        let list = self.children.as_ref()?;
        RefMut::filter_map(list.borrow_mut(), |c| c.nodes.get_mut(index)).ok()
    }

    // === Mutation ===

    /// Turn into an empty object
    pub fn make_object(&mut self) {
        self.make_container(Kind::Object);
    }

    /// Turn into an empty array
    pub fn make_array(&mut self) {
        self.make_container(Kind::Array);
    }

    fn make_container(&mut self, kind: Kind) {
        self.kind = kind;
        self.value = Span::Empty;
        self.children = Some(Children::shared());
    }

    /// Point the value at borrowed text without copying
    ///
    /// Refused for container kinds, which have no text of their own.
    pub fn set_text(&mut self, text: &'a [u8], kind: Kind) -> bool {
        if kind.has_children() {
            return false;
        }
        self.kind = kind;
        self.value = Span::Borrowed(text);
        self.children = None;
        true
    }

    /// Point the key at borrowed text without copying
    pub fn set_key(&mut self, key: &'a [u8]) {
        self.key = Span::Borrowed(key);
        flags::set(&mut self.flags, NodeFlags::HAS_KEY, true);
    }

    /// Forget the key, e.g. when lifting a value out of its object
    pub fn unset_key(&mut self) {
        flags::set(&mut self.flags, NodeFlags::HAS_KEY, false);
    }

    /// Alias of [`unset_key`](Self::unset_key)
    pub fn detach(&mut self) {
        self.unset_key();
    }

    /// Back to an undefined node with no key, keeping the arena
    pub fn reset(&mut self) {
        self.kind = Kind::Undefined;
        self.value = Span::Empty;
        self.key = Span::Empty;
        self.flags = NodeFlags::empty();
        self.children = None;
    }

    /// Become a handle to the same value as `other`, keeping this arena
    pub fn set(&mut self, other: &Node<'a>) {
        self.kind = other.kind;
        self.value = other.value.clone();
        self.key = other.key.clone();
        self.flags = other.flags;
        self.children = other.children.clone();
    }

    /// Whether `list` is this node's child list or appears anywhere below it
    fn reaches(&self, list: &ChildList<'a>) -> bool {
        let Some(own) = &self.children else {
            return false;
        };
        let mut pending = vec![Rc::clone(own)];
        while let Some(current) = pending.pop() {
            if Rc::ptr_eq(&current, list) {
                return true;
            }
            pending.extend(
                current
                    .borrow()
                    .nodes
                    .iter()
                    .filter_map(|child| child.children.clone()),
            );
        }
        false
    }

    /// Append a child
    ///
    /// Objects only take keyed children; arrays drop any key. Adding a
    /// container that already holds this node is refused.
    pub fn add(&self, mut node: Node<'a>) -> bool {
        let Some(list) = &self.children else {
            return false;
        };
        if node.reaches(list) {
            return false;
        }
        match self.kind {
            Kind::Object if !node.has_key() => false,
            Kind::Object => {
                list.borrow_mut().push_keyed(node);
                true
            }
            _ => {
                node.unset_key();
                list.borrow_mut().nodes.push(node);
                true
            }
        }
    }

    /// Append borrowed text to an array without copying
    pub fn add_borrowed(&self, text: &'a [u8], kind: Kind) -> bool {
        if self.kind != Kind::Array {
            return false;
        }
        let mut node = self.sibling();
        node.set_text(text, kind) && self.add(node)
    }

    /// Append a borrowed key and text to an object without copying
    pub fn add_borrowed_kv(&self, key: &'a [u8], text: &'a [u8], kind: Kind) -> bool {
        if self.kind != Kind::Object {
            return false;
        }
        let mut node = self.sibling();
        node.set_key(key);
        node.set_text(text, kind) && self.add(node)
    }

    /// Append an undefined child and hand it out for filling
    ///
    /// On an object the child has no key yet, so the list is no longer
    /// considered sorted.
    ///
    /// # Panics
    ///
    /// The handle holds this node's child list mutably borrowed. Any other
    /// call on this node that reads or changes its children (`len`, `get`,
    /// `print`, `add`, ...) panics until the handle is dropped.
    pub fn add_empty(&self) -> Option<RefMut<'_, Node<'a>>> {
        let list = self.children.as_ref()?;
        let mut children = list.borrow_mut();
        if self.kind == Kind::Object {
            children.set_sorted(false);
        }
        children.nodes.push(self.sibling());
        RefMut::filter_map(children, |c| c.nodes.last_mut()).ok()
    }

    /// Append an undefined child under `key` and hand it out for filling
    ///
    /// # Panics
    ///
    /// The handle holds this node's child list mutably borrowed. Any other
    /// call on this node that reads or changes its children (`len`, `get`,
    /// `print`, `add`, ...) panics until the handle is dropped.
    pub fn add_empty_with_key<K: Encode + ?Sized>(&self, key: &K) -> Option<RefMut<'_, Node<'a>>> {
        let list = self.object_children()?;
        let mut node = self.sibling();
        if !node.write_key(key) {
            return None;
        }
        let mut children = list.borrow_mut();
        children.push_keyed(node);
        RefMut::filter_map(children, |c| c.nodes.last_mut()).ok()
    }

    /// Remove an object's child by key
    pub fn erase(&self, key: &str) -> bool {
        let Some(list) = self.object_children() else {
            return false;
        };
        let mut children = list.borrow_mut();
        match children.position(key.as_bytes()) {
            Some(index) => {
                children.nodes.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove a child by position
    pub fn erase_at(&self, index: usize) -> bool {
        let Some(list) = &self.children else {
            return false;
        };
        let mut children = list.borrow_mut();
        if index >= children.nodes.len() {
            return false;
        }
        children.nodes.remove(index);
        true
    }

    /// Replace the value of an object's child, keeping its key
    pub fn update(&self, key: &str, node: Node<'a>) -> bool {
        let Some(list) = self.object_children() else {
            return false;
        };
        let index = list.borrow().position(key.as_bytes());
        index.is_some_and(|index| self.replace(list, index, node))
    }

    /// Replace a child by position; object children keep their key
    pub fn update_at(&self, index: usize, node: Node<'a>) -> bool {
        match &self.children {
            Some(list) => self.replace(list, index, node),
            None => false,
        }
    }

    fn replace(&self, list: &ChildList<'a>, index: usize, mut node: Node<'a>) -> bool {
        if node.reaches(list) {
            return false;
        }
        let mut children = list.borrow_mut();
        let Some(slot) = children.nodes.get_mut(index) else {
            return false;
        };
        node.key = slot.key.clone();
        flags::set(&mut node.flags, NodeFlags::HAS_KEY, slot.has_key());
        *slot = node;
        true
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Node");
        debug.field("kind", &self.kind);
        if self.has_key() {
            debug.field("key", &self.key);
        }
        if self.kind.has_children() {
            debug.field("children", &self.len());
        } else {
            debug.field("value", &self.value);
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> SharedArena {
        Arena::shared_default()
    }

    #[test]
    #[should_panic(expected = "already mutably borrowed")]
    fn test_live_child_handle_blocks_container() {
        let root = Node::object(arena());
        let _child = root.add_empty_with_key("k");
        root.len();
    }

    #[test]
    fn test_container_usable_after_handle_drops() {
        let root = Node::object(arena());
        assert!(root.write_kv("a", &1));
        {
            let mut child = root.get_mut("a").unwrap();
            assert!(child.write(&2));
        }
        assert_eq!(root.len(), 1);
        assert_eq!(root.get("a").and_then(|n| n.int32()), Some(2));

        root.add_empty().unwrap().make_array();
        assert_eq!(root.at(1).map(|n| n.kind()), Some(Kind::Array));
        assert!(root.at_mut(1).unwrap().write_vals(&[&true]));
        assert_eq!(root.at(1).map(|n| n.len()), Some(1));
    }

    #[test]
    fn test_kind_predicates() {
        assert!(Kind::Object.has_children());
        assert!(Kind::Real.is_number());
        assert!(Kind::Null.is_scalar());
        assert!(!Kind::Undefined.is_scalar());
        assert_eq!(Kind::Integer.to_string(), "integer");
    }

    #[test]
    fn test_add_to_object_requires_key() {
        let root = Node::object(arena());
        let mut child = Node::new(Rc::clone(root.arena()));
        child.set_text(b"1", Kind::Integer);
        assert!(!root.add(child.clone()));

        child.set_key(b"a");
        assert!(root.add(child));
        assert_eq!(root.len(), 1);
        assert!(root.sorted());
    }

    #[test]
    fn test_out_of_order_key_clears_sorted() {
        let root = Node::object(arena());
        assert!(root.add_borrowed_kv(b"b", b"1", Kind::Integer));
        assert!(root.sorted());
        assert!(root.add_borrowed_kv(b"a", b"2", Kind::Integer));
        assert!(!root.sorted());

        assert_eq!(root.get("a").and_then(|n| n.int32()), Some(2));
        assert!(root.sorted());
        assert_eq!(root.at(0).and_then(|n| n.key().map(<[u8]>::to_vec)), Some(b"a".to_vec()));
    }

    #[test]
    fn test_array_add_drops_key() {
        let root = Node::array(arena());
        let mut child = Node::new(Rc::clone(root.arena()));
        child.set_text(b"x", Kind::String);
        child.set_key(b"k");
        assert!(root.add(child));
        assert!(!root.at(0).unwrap().has_key());
    }

    #[test]
    fn test_add_self_is_refused() {
        let root = Node::array(arena());
        assert!(!root.add(root.clone()));

        let inner = Node::array(Rc::clone(root.arena()));
        assert!(root.add(inner.clone()));
        assert!(!inner.add(root.clone()));
    }

    #[test]
    fn test_erase_and_update() {
        let root = Node::object(arena());
        root.add_borrowed_kv(b"a", b"1", Kind::Integer);
        root.add_borrowed_kv(b"b", b"2", Kind::Integer);

        let mut replacement = Node::new(Rc::clone(root.arena()));
        replacement.set_text(b"true", Kind::Bool);
        assert!(root.update("b", replacement));
        let b = root.get("b").unwrap();
        assert_eq!(b.boolean(), Some(true));
        assert_eq!(b.key(), Some(&b"b"[..]));

        assert!(root.erase("a"));
        assert!(!root.erase("a"));
        assert_eq!(root.len(), 1);
        assert!(root.erase_at(0));
        assert!(root.is_empty());
    }

    #[test]
    fn test_get_mut_edits_in_place() {
        let root = Node::object(arena());
        root.add_borrowed_kv(b"n", b"1", Kind::Integer);
        root.get_mut("n").unwrap().set_text(b"7", Kind::Integer);
        assert_eq!(root.get("n").and_then(|n| n.uint8()), Some(7));
    }

    #[test]
    fn test_accessors_are_checked() {
        let mut node = Node::new(arena());
        node.set_text(b"300", Kind::Integer);
        assert_eq!(node.uint8(), None);
        assert_eq!(node.int16(), Some(300));
        assert_eq!(node.real(), Some(300.0));
        assert_eq!(node.str(), None);
        assert_eq!(node.boolean(), None);

        node.set_text(br"a\nb", Kind::String);
        assert_eq!(node.str(), Some(r"a\nb"));
        assert_eq!(node.unescaped().as_deref(), Some("a\nb"));
        assert_eq!(node.int64(), None);
    }

    #[test]
    fn test_set_text_refuses_containers() {
        let mut node = Node::new(arena());
        assert!(!node.set_text(b"{}", Kind::Object));
        assert!(node.is_undefined());
    }

    #[test]
    fn test_reset_and_set() {
        let root = Node::object(arena());
        root.add_borrowed_kv(b"a", b"1", Kind::Integer);

        let mut alias = Node::new(arena());
        alias.set(&root);
        assert_eq!(alias.len(), 1);
        alias.add_borrowed_kv(b"b", b"2", Kind::Integer);
        assert_eq!(root.len(), 2);

        alias.reset();
        assert!(alias.is_undefined());
        assert_eq!(root.len(), 2);
    }

    #[test]
    fn test_detach_clears_key() {
        let root = Node::object(arena());
        root.add_borrowed_kv(b"a", b"1", Kind::Integer);
        let mut lifted = root.get("a").unwrap();
        assert!(lifted.keys_equal(&root.at(0).unwrap()));
        lifted.detach();
        assert!(!lifted.has_key());
        assert!(!lifted.keys_equal(&root.at(0).unwrap()));
    }

    #[test]
    fn test_deep_tree_drop_is_iterative() {
        let root = Node::array(arena());
        let mut tail = root.clone();
        for _ in 0..100_000 {
            let next = Node::array(Rc::clone(root.arena()));
            tail.add(next.clone());
            tail = next;
        }
        drop(tail);
        drop(root);
    }
}

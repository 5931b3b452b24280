//! Building values through the arena

use super::{Encode, Node, Span};
use crate::flags::{self, NodeFlags};

impl<'a> Node<'a> {
    /// Encode `value` as this node's value
    ///
    /// Booleans and null are static literals and never touch the arena.
    /// Returns false when the value cannot be stored; the node is then
    /// left unchanged.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> bool {
        if let Some(text) = value.literal() {
            self.kind = value.kind();
            self.value = Span::Borrowed(text);
            self.children = None;
            return true;
        }
        let Some(slice) = self.arena.borrow_mut().write(&value) else {
            return false;
        };
        self.kind = value.kind();
        self.value = Span::Arena(slice);
        self.children = None;
        true
    }

    /// Encode `key` as this node's key
    pub fn write_key<K: Encode + ?Sized>(&mut self, key: &K) -> bool {
        let span = match key.literal() {
            Some(text) => Span::Borrowed(text),
            None => match self.arena.borrow_mut().write(&key) {
                Some(slice) => Span::Arena(slice),
                None => return false,
            },
        };
        self.key = span;
        flags::set(&mut self.flags, NodeFlags::HAS_KEY, true);
        true
    }

    /// Encode both key and value into this node
    pub fn write_pair<K, V>(&mut self, key: &K, value: &V) -> bool
    where
        K: Encode + ?Sized,
        V: Encode + ?Sized,
    {
        self.write_key(key) && self.write(value)
    }

    /// Append a keyed child holding `value` to this object
    pub fn write_kv<K, V>(&self, key: &K, value: &V) -> bool
    where
        K: Encode + ?Sized,
        V: Encode + ?Sized,
    {
        match self.add_empty_with_key(key) {
            Some(mut child) => child.write(value),
            None => false,
        }
    }

    /// Append every pair in order, stopping at the first failure
    pub fn write_kvs(&self, pairs: &[(&str, &dyn Encode)]) -> bool {
        pairs.iter().all(|(key, value)| self.write_kv(*key, *value))
    }

    /// Append a child holding `value` to this array
    pub fn write_val<V: Encode + ?Sized>(&self, value: &V) -> bool {
        if self.kind != super::Kind::Array {
            return false;
        }
        match self.add_empty() {
            Some(mut child) => child.write(value),
            None => false,
        }
    }

    /// Append every value in order, stopping at the first failure
    pub fn write_vals(&self, values: &[&dyn Encode]) -> bool {
        values.iter().all(|value| self.write_val(*value))
    }
}

/// Append key/value pairs to an object node
///
/// ```
/// use frugal_json::{Node, write_kv};
///
/// let mut root = Node::default();
/// root.make_object();
/// assert!(write_kv!(root, "id" => 7, "name" => "frugal"));
/// assert_eq!(root.to_string(), r#"{"id":7,"name":"frugal"}"#);
/// ```
#[macro_export]
macro_rules! write_kv {
    ($node:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $node.write_kvs(&[$(($key, &$value as &dyn $crate::Encode)),+])
    };
}

/// Append values to an array node
///
/// ```
/// use frugal_json::{Node, Null, write_vals};
///
/// let mut root = Node::default();
/// root.make_array();
/// assert!(write_vals!(root, 1, 2.5, true, Null, "x"));
/// assert_eq!(root.to_string(), r#"[1,2.5,true,null,"x"]"#);
/// ```
#[macro_export]
macro_rules! write_vals {
    ($node:expr, $($value:expr),+ $(,)?) => {
        $node.write_vals(&[$(&$value as &dyn $crate::Encode),+])
    };
}

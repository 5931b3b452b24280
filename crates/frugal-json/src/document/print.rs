//! JSON text output
//!
//! Printing walks the tree with an explicit stack. At `level == 0` the
//! output is compact. At `level > 0` every child goes on its own line,
//! indented by its parent's level, and nested containers indent two more
//! spaces than their parent.

use super::{ChildList, Kind, Node};
use crate::{
    error::{Error, Result},
    memory::{BufferChain, ChainWriter},
};
use bytes::Bytes;
use std::{fmt, io, rc::Rc};

const SPACES: &[u8; 32] = b"                                ";

/// Step between nested indentation levels
const INDENT_STEP: usize = 2;

struct OpenContainer<'a> {
    list: ChildList<'a>,
    next: usize,
    kind: Kind,
    level: usize,
}

fn write_indent<W: io::Write + ?Sized>(out: &mut W, mut width: usize) -> io::Result<()> {
    out.write_all(b"\n")?;
    while width > 0 {
        let step = width.min(SPACES.len());
        out.write_all(&SPACES[..step])?;
        width -= step;
    }
    Ok(())
}

fn write_quoted<W: io::Write + ?Sized>(out: &mut W, text: &[u8]) -> io::Result<()> {
    out.write_all(b"\"")?;
    out.write_all(text)?;
    out.write_all(b"\"")
}

fn closing(kind: Kind) -> &'static [u8] {
    if kind == Kind::Object { b"}" } else { b"]" }
}

/// Write the key and the opening part of `node`; containers with
/// children are returned for the caller to walk
fn open<'a, W: io::Write + ?Sized>(
    out: &mut W,
    node: &Node<'a>,
    level: usize,
) -> io::Result<Option<OpenContainer<'a>>> {
    if let Some(key) = node.key() {
        write_quoted(out, key)?;
        out.write_all(b":")?;
    }
    match node.kind {
        Kind::Object | Kind::Array => {
            let opening: &[u8] = if node.kind == Kind::Object { b"{" } else { b"[" };
            out.write_all(opening)?;
            match &node.children {
                Some(list) if !list.borrow().is_empty() => Ok(Some(OpenContainer {
                    list: Rc::clone(list),
                    next: 0,
                    kind: node.kind,
                    level,
                })),
                _ => {
                    out.write_all(closing(node.kind))?;
                    Ok(None)
                }
            }
        }
        Kind::String => {
            write_quoted(out, node.as_bytes())?;
            Ok(None)
        }
        Kind::Undefined => Ok(None),
        _ => {
            out.write_all(node.as_bytes())?;
            Ok(None)
        }
    }
}

impl<'a> Node<'a> {
    /// Write this node as JSON text
    ///
    /// `level == 0` is compact; otherwise children are indented by `level`
    /// spaces. Undefined nodes produce no output.
    pub fn print<W: io::Write + ?Sized>(&self, out: &mut W, level: usize) -> io::Result<()> {
        let mut stack: Vec<OpenContainer<'a>> = Vec::new();
        stack.extend(open(out, self, level)?);

        while let Some(top) = stack.last_mut() {
            let child = top.list.borrow().nodes.get(top.next).cloned();
            match child {
                Some(child) => {
                    if top.next > 0 {
                        out.write_all(b",")?;
                    }
                    top.next += 1;
                    let child_level = if top.level > 0 {
                        write_indent(out, top.level)?;
                        top.level + INDENT_STEP
                    } else {
                        0
                    };
                    stack.extend(open(out, &child, child_level)?);
                }
                None => {
                    if top.level > 0 {
                        write_indent(out, top.level.saturating_sub(INDENT_STEP))?;
                    }
                    out.write_all(closing(top.kind))?;
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Printed text as an owned byte vector
    pub fn to_json(&self, level: usize) -> Vec<u8> {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.print(&mut out, level);
        out
    }

    /// Print into pool chunks and return the text as one contiguous block
    pub fn serialize(&self, level: usize) -> Result<Bytes> {
        let pool = self
            .arena
            .borrow_mut()
            .pool()
            .ok_or_else(|| Error::memory("no pool available for serialization"))?;
        let mut chain = BufferChain::new();
        self.print(&mut ChainWriter::new(&mut chain, &pool), level)?;
        Ok(chain.data_copy_one_piece())
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_json(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::try_parse;

    fn printed(input: &str, level: usize) -> String {
        let root = try_parse(input.as_bytes()).unwrap();
        String::from_utf8(root.to_json(level)).unwrap()
    }

    #[test]
    fn test_compact_round_trip() {
        let text = r#"{"a":1,"b":[true,null,"x"],"c":{},"d":[]}"#;
        assert_eq!(printed(text, 0), text);
    }

    #[test]
    fn test_compact_strips_whitespace() {
        assert_eq!(printed("[ 1 , { \"k\" : -2.5 } ]", 0), r#"[1,{"k":-2.5}]"#);
    }

    #[test]
    fn test_pretty_indentation() {
        let expected = "{\n  \"a\":1,\n  \"b\":[\n    true,\n    null\n  ]\n}";
        assert_eq!(printed(r#"{"a":1,"b":[true,null]}"#, 2), expected);
    }

    #[test]
    fn test_pretty_empty_containers() {
        assert_eq!(printed(r#"{"a":[],"b":{}}"#, 2), "{\n  \"a\":[],\n  \"b\":{}\n}");
    }

    #[test]
    fn test_scalar_root() {
        assert_eq!(printed("\"s\"", 4), "\"s\"");
    }

    #[test]
    fn test_serialize_matches_print() {
        let root = try_parse(br#"{"list":[1,2,3],"s":"text"}"#).unwrap();
        let bytes = root.serialize(0).unwrap();
        assert_eq!(&bytes[..], root.to_json(0).as_slice());
        assert_eq!(root.to_string(), r#"{"list":[1,2,3],"s":"text"}"#);
    }
}

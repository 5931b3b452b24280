//! Text encoding of scalar values for the arena
//!
//! Every value a node can hold implements [`Encode`]: it knows its
//! [`Kind`] and how to render itself as JSON text into a byte region.
//! Strings are stored escaped, so printing never has to transform them.

use super::Kind;
use crate::memory::Fill;
use smallvec::SmallVec;
use std::io::Write;

/// A value that can be rendered as JSON text
pub trait Encode {
    /// Kind of node the value produces
    fn kind(&self) -> Kind;

    /// Render into `dst`, reporting the needed size when it does not fit
    fn encode(&self, dst: &mut [u8]) -> Fill;

    /// Fixed text that needs no arena space, such as `true` or `null`
    fn literal(&self) -> Option<&'static [u8]> {
        None
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn kind(&self) -> Kind {
        (**self).kind()
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        (**self).encode(dst)
    }

    fn literal(&self) -> Option<&'static [u8]> {
        (**self).literal()
    }
}

/// JSON `null`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

fn copy_into(src: &[u8], dst: &mut [u8]) -> Fill {
    match dst.get_mut(..src.len()) {
        Some(head) => {
            head.copy_from_slice(src);
            Fill::Written(src.len())
        }
        None => Fill::NeedsRoom(src.len()),
    }
}

fn encode_formatted(args: std::fmt::Arguments<'_>, dst: &mut [u8]) -> Fill {
    let mut text: SmallVec<[u8; 48]> = SmallVec::new();
    if text.write_fmt(args).is_err() {
        return Fill::Invalid;
    }
    copy_into(&text, dst)
}

macro_rules! encode_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn kind(&self) -> Kind {
                    Kind::Integer
                }

                fn encode(&self, dst: &mut [u8]) -> Fill {
                    encode_formatted(format_args!("{self}"), dst)
                }
            }
        )*
    };
}

encode_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! encode_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn kind(&self) -> Kind {
                    Kind::Real
                }

                // `{:?}` keeps a `.0` or exponent, so the text reads back as real
                fn encode(&self, dst: &mut [u8]) -> Fill {
                    if !self.is_finite() {
                        return Fill::Invalid;
                    }
                    encode_formatted(format_args!("{self:?}"), dst)
                }
            }
        )*
    };
}

encode_float!(f32, f64);

impl Encode for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        copy_into(self.literal().unwrap_or_default(), dst)
    }

    fn literal(&self) -> Option<&'static [u8]> {
        Some(if *self { b"true" } else { b"false" })
    }
}

impl Encode for Null {
    fn kind(&self) -> Kind {
        Kind::Null
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        copy_into(b"null", dst)
    }

    fn literal(&self) -> Option<&'static [u8]> {
        Some(b"null")
    }
}

impl Encode for () {
    fn kind(&self) -> Kind {
        Kind::Null
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        Null.encode(dst)
    }

    fn literal(&self) -> Option<&'static [u8]> {
        Null.literal()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn kind(&self) -> Kind {
        self.as_ref().map_or(Kind::Null, Encode::kind)
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        match self {
            Some(value) => value.encode(dst),
            None => Null.encode(dst),
        }
    }

    fn literal(&self) -> Option<&'static [u8]> {
        match self {
            Some(value) => value.literal(),
            None => Null.literal(),
        }
    }
}

impl Encode for str {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        let raw = self.as_bytes();
        let needed = escaped_len(raw);
        if needed > dst.len() {
            return Fill::NeedsRoom(needed);
        }
        Fill::Written(escape_into(raw, dst))
    }
}

impl Encode for String {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        self.as_str().encode(dst)
    }
}

impl Encode for char {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn encode(&self, dst: &mut [u8]) -> Fill {
        let mut buf = [0u8; 4];
        self.encode_utf8(&mut buf).encode(dst)
    }
}

/// Escape sequence for bytes that may not appear raw inside a string
#[inline]
fn escape_sequence(byte: u8) -> Option<&'static [u8]> {
    match byte {
        b'\\' => Some(b"\\\\"),
        b'"' => Some(b"\\\""),
        b'/' => Some(b"\\/"),
        0x08 => Some(b"\\b"),
        0x0c => Some(b"\\f"),
        b'\n' => Some(b"\\n"),
        b'\r' => Some(b"\\r"),
        b'\t' => Some(b"\\t"),
        _ => None,
    }
}

/// Length of `raw` once escaped
pub fn escaped_len(raw: &[u8]) -> usize {
    raw.iter()
        .map(|&b| escape_sequence(b).map_or(1, <[u8]>::len))
        .sum()
}

/// Escape `raw` into the front of `dst`; `dst` must hold
/// [`escaped_len`] bytes. Returns the bytes written.
pub fn escape_into(raw: &[u8], dst: &mut [u8]) -> usize {
    let mut at = 0;
    for &byte in raw {
        match escape_sequence(byte) {
            Some(seq) => {
                dst[at..at + seq.len()].copy_from_slice(seq);
                at += seq.len();
            }
            None => {
                dst[at] = byte;
                at += 1;
            }
        }
    }
    at
}

/// Escaped copy of `raw`
pub fn escape(raw: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; escaped_len(raw)];
    escape_into(raw, &mut out);
    out
}

/// Decode the escapes produced by [`escape`]; other sequences such as
/// `\u` escapes are kept verbatim
pub fn unescape(escaped: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        match bytes.next() {
            Some(b'b') => out.push(0x08),
            Some(b'f') => out.push(0x0c),
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(b @ (b'\\' | b'"' | b'/')) => out.push(b),
            Some(other) => out.extend_from_slice(&[b'\\', other]),
            None => out.push(b'\\'),
        }
    }
    out
}

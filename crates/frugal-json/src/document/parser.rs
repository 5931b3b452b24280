//! Zero-copy iterative JSON parser
//!
//! One left-to-right scan with an explicit stack of open containers, so
//! nesting never grows the call stack. Scalars are recorded as spans into
//! the input; the parser itself allocates only child lists.

use super::{ChildList, Children, Kind, Node};
use crate::{
    config::{EngineConfig, ParseConfig},
    error::Result as EngineResult,
    memory::{Arena, SharedArena},
};
use smallvec::SmallVec;
use std::{cell::Cell, fmt, rc::Rc};
use tracing::debug;

/// Structural problem found while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Input ended before the document was complete
    UnexpectedEnd,
    /// A comma with nothing before it, or two commas in a row
    MissingElement,
    /// A comma directly before a closing bracket
    TrailingComma,
    /// Two elements without a comma between them
    MissingSeparator,
    /// `]` closing an object or `}` closing an array
    MismatchedClose,
    /// Object member does not start with a string key
    ExpectedKey,
    /// Key string has no closing quote
    UnterminatedKey,
    /// No `:` and value after a key
    MissingValue,
    /// Text starting like `true`, `false` or `null` that is not one
    InvalidLiteral,
    /// String value has no closing quote
    UnterminatedString,
    /// Malformed number or unexpected character
    InvalidNumber,
    /// Nesting exceeds the configured limit
    DepthLimitExceeded,
}

impl ParseErrorKind {
    /// Static human-readable description
    pub fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "unexpected end",
            Self::MissingElement => "unexpected end in object, or no value between commas",
            Self::TrailingComma => "no value after comma",
            Self::MissingSeparator => "No separator between elements",
            Self::MismatchedClose => "closing bracket does not match the open container",
            Self::ExpectedKey => "object member must start with a string key",
            Self::UnterminatedKey => "key doesn't end",
            Self::MissingValue => "couldn't find the beginning of the value in object",
            Self::InvalidLiteral => "invalid primitive",
            Self::UnterminatedString => "string doesn't end",
            Self::InvalidNumber => "isn't parseable",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Parse failure with the byte offset where it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at position {position}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Nesting depth guard for containers
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthTracker {
    current_depth: usize,
    max_depth: Option<usize>,
}

impl DepthTracker {
    /// Tracker honoring `config.max_depth`
    pub fn from_config(config: &ParseConfig) -> Self {
        Self {
            current_depth: 0,
            max_depth: config.max_depth,
        }
    }

    /// Tracker with a fixed limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            current_depth: 0,
            max_depth: Some(max_depth),
        }
    }

    /// Enter a new nesting level (array/object)
    pub fn enter(&mut self) -> Result<(), ParseErrorKind> {
        if self.max_depth.is_some_and(|max| self.current_depth >= max) {
            return Err(ParseErrorKind::DepthLimitExceeded);
        }
        self.current_depth += 1;
        Ok(())
    }

    /// Exit a nesting level
    pub fn exit(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    pub fn current_depth(&self) -> usize {
        self.current_depth
    }
}

/// Parser counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Documents handed to the parser
    pub total_parses: u64,
    /// Documents rejected
    pub failed_parses: u64,
    /// Bytes consumed by successful parses
    pub bytes_parsed: u64,
}

/// Configurable parser front end
///
/// Every tree it produces writes into the parser's arena.
#[derive(Debug)]
pub struct Parser {
    config: ParseConfig,
    arena: SharedArena,
    stats: Cell<ParseStats>,
}

impl Parser {
    /// Parser with default settings
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    /// Parser with custom configuration
    pub fn with_config(config: ParseConfig) -> Self {
        Self::with_arena(config, Arena::shared_default())
    }

    /// Parser whose trees share `arena`
    pub fn with_arena(config: ParseConfig, arena: SharedArena) -> Self {
        Self {
            config,
            arena,
            stats: Cell::new(ParseStats::default()),
        }
    }

    /// Parser over a private pool, both built from one engine config
    pub fn from_engine_config(config: &EngineConfig) -> EngineResult<Self> {
        let arena = Arena::with_config(&config.pool)?.shared();
        Ok(Self::with_arena(config.parse.clone(), arena))
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    pub fn arena(&self) -> &SharedArena {
        &self.arena
    }

    /// Parse one complete JSON value; bytes after it are ignored
    pub fn parse<'a>(&self, input: &'a [u8]) -> Result<Node<'a>, ParseError> {
        self.parse_prefix(input).map(|(node, _)| node)
    }

    /// Parse one value and report how many bytes it spanned
    pub fn parse_prefix<'a>(&self, input: &'a [u8]) -> Result<(Node<'a>, usize), ParseError> {
        let outcome = scan(input, &self.arena, &self.config);
        let mut stats = self.stats.get();
        stats.total_parses += 1;
        match &outcome {
            Ok((_, consumed)) => stats.bytes_parsed += *consumed as u64,
            Err(_) => stats.failed_parses += 1,
        }
        self.stats.set(stats);
        outcome
    }

    /// Get parser statistics
    pub fn stats(&self) -> ParseStats {
        self.stats.get()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with default settings into a fresh arena
pub fn try_parse(input: &[u8]) -> Result<Node<'_>, ParseError> {
    scan(input, &Arena::shared_default(), &ParseConfig::default()).map(|(node, _)| node)
}

/// Parse one value from the front of `input`, returning the bytes consumed
pub fn parse_prefix(input: &[u8]) -> Result<(Node<'_>, usize), ParseError> {
    scan(input, &Arena::shared_default(), &ParseConfig::default())
}

/// Boolean-reporting parse; on failure the node carries a diagnostic
pub fn parse(input: &[u8]) -> (bool, Node<'_>) {
    let mut root = Node::default();
    let ok = root.parse(input);
    (ok, root)
}

impl<'a> Node<'a> {
    /// Parse `input` into this node, reusing its arena
    ///
    /// On failure the node is reset to undefined and
    /// [`diagnostic`](Self::diagnostic) describes the problem.
    pub fn parse(&mut self, input: &'a [u8]) -> bool {
        match scan(input, &self.arena, &ParseConfig::default()) {
            Ok((node, _)) => {
                *self = node;
                true
            }
            Err(err) => {
                self.reset();
                self.value = super::Span::Borrowed(err.kind.message().as_bytes());
                false
            }
        }
    }
}

enum Frame<'a> {
    Object(ChildList<'a>),
    Array(ChildList<'a>),
}

impl<'a> Frame<'a> {
    fn list(&self) -> &ChildList<'a> {
        match self {
            Frame::Object(list) | Frame::Array(list) => list,
        }
    }

    fn closes_with(&self, byte: u8) -> bool {
        matches!((self, byte), (Frame::Object(_), b'}') | (Frame::Array(_), b']'))
    }
}

fn scan<'a>(
    input: &'a [u8],
    arena: &SharedArena,
    config: &ParseConfig,
) -> Result<(Node<'a>, usize), ParseError> {
    let outcome = scan_value(input, arena, config);
    if let Err(err) = &outcome {
        debug!(position = err.position, error = %err.kind, "parse failed");
    }
    outcome
}

fn scan_value<'a>(
    input: &'a [u8],
    arena: &SharedArena,
    config: &ParseConfig,
) -> Result<(Node<'a>, usize), ParseError> {
    use ParseErrorKind::*;

    let fail = |kind, position| Err(ParseError::new(kind, position));
    let mut frames: SmallVec<[Frame<'a>; 16]> = SmallVec::new();
    let mut depth = DepthTracker::from_config(config);
    let mut root: Option<Node<'a>> = None;
    let mut i = 0;

    loop {
        i = skip_whitespace(input, i);
        let Some(&byte) = input.get(i) else {
            return fail(UnexpectedEnd, i);
        };
        let mut node = Node::new(Rc::clone(arena));

        if let Some(frame) = frames.last() {
            let filled = frame.list().borrow().len();
            match byte {
                b',' => {
                    if filled == 0 {
                        return fail(MissingElement, i);
                    }
                    i = skip_whitespace(input, i + 1);
                    match input.get(i) {
                        None | Some(b',') => return fail(MissingElement, i),
                        Some(b'}' | b']') => return fail(TrailingComma, i),
                        Some(_) => {}
                    }
                }
                b'}' | b']' => {
                    if !frame.closes_with(byte) {
                        return fail(MismatchedClose, i);
                    }
                    frames.pop();
                    depth.exit();
                    i += 1;
                    if frames.is_empty() {
                        return match root {
                            Some(root) => Ok((root, i)),
                            None => fail(UnexpectedEnd, i),
                        };
                    }
                    continue;
                }
                _ if filled != 0 => return fail(MissingSeparator, i),
                _ => {}
            }

            if let Frame::Object(_) = frame {
                if input.get(i) != Some(&b'"') {
                    return fail(ExpectedKey, i);
                }
                let Some(end) = find_string_end(input, i + 1) else {
                    return fail(UnterminatedKey, i);
                };
                node.set_key(&input[i + 1..end]);
                i = skip_whitespace(input, end + 1);
                if input.get(i) != Some(&b':') {
                    return fail(MissingValue, i);
                }
                i = skip_whitespace(input, i + 1);
                if matches!(input.get(i), None | Some(b'}' | b']' | b',')) {
                    return fail(MissingValue, i);
                }
            }
        }

        let Some(&byte) = input.get(i) else {
            return fail(UnexpectedEnd, i);
        };
        let start = i;
        match byte {
            b'{' | b'[' => {
                if let Err(kind) = depth.enter() {
                    return fail(kind, i);
                }
                let list = Children::shared();
                node.children = Some(Rc::clone(&list));
                let frame = if byte == b'{' {
                    node.kind = Kind::Object;
                    Frame::Object(list)
                } else {
                    node.kind = Kind::Array;
                    Frame::Array(list)
                };
                match frames.last() {
                    Some(parent) => push_child(parent, node),
                    None => root = Some(node),
                }
                frames.push(frame);
                i += 1;
                continue;
            }
            b'"' => {
                let Some(end) = find_string_end(input, i + 1) else {
                    return fail(UnterminatedString, i);
                };
                node.set_text(&input[i + 1..end], Kind::String);
                i = end + 1;
            }
            b't' | b'f' | b'n' => {
                let (literal, kind): (&[u8], _) = match byte {
                    b't' => (b"true", Kind::Bool),
                    b'f' => (b"false", Kind::Bool),
                    _ => (b"null", Kind::Null),
                };
                if !input[i..].starts_with(literal) {
                    return fail(InvalidLiteral, i);
                }
                i += literal.len();
                node.set_text(&input[start..i], kind);
            }
            _ => {
                let Some((end, kind)) = scan_number(input, i) else {
                    return fail(InvalidNumber, i);
                };
                i = end;
                node.set_text(&input[start..i], kind);
            }
        }

        match frames.last() {
            Some(parent) => push_child(parent, node),
            None => return Ok((node, i)),
        }
    }
}

fn push_child<'a>(frame: &Frame<'a>, node: Node<'a>) {
    let mut children = frame.list().borrow_mut();
    match frame {
        Frame::Object(_) => children.push_keyed(node),
        Frame::Array(_) => children.nodes.push(node),
    }
}

#[inline]
fn skip_whitespace(input: &[u8], from: usize) -> usize {
    input
        .get(from..)
        .and_then(|rest| {
            rest.iter()
                .position(|b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        })
        .map_or(input.len(), |offset| from + offset)
}

/// Index of the closing quote of a string whose body starts at `start`
fn find_string_end(input: &[u8], start: usize) -> Option<usize> {
    let mut from = start;
    while let Some(offset) = memchr::memchr(b'"', input.get(from..)?) {
        let quote = from + offset;
        let backslashes = input[start..quote]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        if backslashes % 2 == 0 {
            return Some(quote);
        }
        from = quote + 1;
    }
    None
}

fn count_digits(input: &[u8], from: usize) -> usize {
    input
        .get(from..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

/// End offset and kind of the number starting at `start`
fn scan_number(input: &[u8], start: usize) -> Option<(usize, Kind)> {
    let mut end = start;
    if input.get(end) == Some(&b'-') {
        end += 1;
    }
    let digits = count_digits(input, end);
    if digits == 0 {
        return None;
    }
    end += digits;

    let mut kind = Kind::Integer;
    if input.get(end) == Some(&b'.') {
        let fraction = count_digits(input, end + 1);
        if fraction == 0 {
            return None;
        }
        end += 1 + fraction;
        kind = Kind::Real;
    }
    if matches!(input.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(input.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = count_digits(input, exponent);
        if digits == 0 {
            return None;
        }
        end = exponent + digits;
        kind = Kind::Real;
    }
    Some((end, kind))
}

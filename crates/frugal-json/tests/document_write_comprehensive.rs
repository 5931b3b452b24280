//! Comprehensive tests for building documents through the arena
//!
//! Coverage:
//! - write / write_key / write_kv / write_kvs / write_vals and the macros
//! - Arena growth while building large documents
//! - Mutation: add, add_empty, erase, update, detach
//! - Serialization into pool chunks
//! - Configuration loading through serde

use frugal_json::{
    Arena, EngineConfig, Kind, Node, Null, ParseErrorKind, Parser, PoolAllocator, PoolConfig,
    try_parse, write_kv, write_vals,
};
use std::rc::Rc;

fn object() -> Node<'static> {
    let mut node = Node::default();
    node.make_object();
    node
}

fn array() -> Node<'static> {
    let mut node = Node::default();
    node.make_array();
    node
}

// === Construction scenario ===

#[test]
fn test_add_empty_with_key_then_print() {
    let root = object();
    assert!(root.add_empty_with_key("k").unwrap().write(&42));
    root.sort_objects();
    let mut out = Vec::new();
    root.print(&mut out, 0).unwrap();
    assert_eq!(out, br#"{"k":42}"#);
}

#[test]
fn test_every_integer_width() {
    let root = object();
    assert!(write_kv!(root,
        "i8" => i8::MIN, "u8" => u8::MAX,
        "i16" => i16::MIN, "u16" => u16::MAX,
        "i32" => i32::MIN, "u32" => u32::MAX,
        "i64" => i64::MIN, "u64" => u64::MAX,
    ));
    assert_eq!(root.get("i8").and_then(|n| n.int8()), Some(i8::MIN));
    assert_eq!(root.get("u8").and_then(|n| n.uint8()), Some(u8::MAX));
    assert_eq!(root.get("i16").and_then(|n| n.int16()), Some(i16::MIN));
    assert_eq!(root.get("u16").and_then(|n| n.uint16()), Some(u16::MAX));
    assert_eq!(root.get("i32").and_then(|n| n.int32()), Some(i32::MIN));
    assert_eq!(root.get("u32").and_then(|n| n.uint32()), Some(u32::MAX));
    assert_eq!(root.get("i64").and_then(|n| n.int64()), Some(i64::MIN));
    assert_eq!(root.get("u64").and_then(|n| n.uint64()), Some(u64::MAX));
}

#[test]
fn test_accessor_range_checks() {
    let root = object();
    root.write_kv("big", &70_000u32);
    let big = root.get("big").unwrap();
    assert_eq!(big.uint16(), None);
    assert_eq!(big.int32(), Some(70_000));
    assert_eq!(big.kind(), Kind::Integer);
}

#[test]
fn test_reals_round_trip_through_text() {
    let root = array();
    for value in [0.1f64, -1234.5678, 1e300, 5e-324] {
        assert!(root.write_val(&value));
    }
    let values: Vec<f64> = root
        .children()
        .unwrap()
        .iter()
        .filter_map(Node::real)
        .collect();
    assert_eq!(values, [0.1, -1234.5678, 1e300, 5e-324]);
}

#[test]
fn test_write_vals_mixed() {
    let root = array();
    let name = String::from("owned");
    assert!(write_vals!(root, 1u8, -2i64, 0.5f32, true, Null, None::<u8>, "lit", name));
    assert_eq!(
        root.to_string(),
        r#"[1,-2,0.5,true,null,null,"lit","owned"]"#
    );
}

#[test]
fn test_write_replaces_previous_value() {
    let mut node = Node::default();
    node.make_array();
    assert!(node.write(&5u8));
    assert_eq!(node.kind(), Kind::Integer);
    assert_eq!(node.len(), 0);
    assert!(node.write("text"));
    assert_eq!(node.str(), Some("text"));
}

#[test]
fn test_write_pair() {
    let mut node = Node::default();
    assert!(node.write_pair("key", &1.5f64));
    assert_eq!(node.key(), Some(&b"key"[..]));
    assert_eq!(node.real(), Some(1.5));
}

#[test]
fn test_integer_keys() {
    let root = object();
    assert!(root.write_kv(&10u8, "ten"));
    assert!(root.write_kv(&2u8, "two"));
    root.sort_objects();
    // keys compare as text
    assert_eq!(root.to_string(), r#"{"10":"ten","2":"two"}"#);
}

#[test]
fn test_strings_are_escaped() {
    let root = object();
    assert!(root.write_kv("path", "C:\\dir/file\n\"x\""));
    let printed = root.to_json(0);
    let parsed: serde_json::Value = serde_json::from_slice(&printed).unwrap();
    assert_eq!(parsed["path"], "C:\\dir/file\n\"x\"");
    assert_eq!(
        root.get("path").and_then(|n| n.unescaped()).as_deref(),
        Some("C:\\dir/file\n\"x\"")
    );
}

#[test]
fn test_short_circuit_stops_at_failure() {
    let root = array();
    assert!(!write_vals!(root, 1, f64::NAN, 3));
    assert_eq!(root.len(), 2);
    assert!(root.at(1).unwrap().is_undefined());
    assert!(root.at(2).is_none());
}

#[test]
fn test_write_kv_on_array_fails() {
    let root = array();
    assert!(!root.write_kv("k", &1));
    assert!(!object().write_val(&1));
    assert!(!Node::default().write_kv("k", &1));
}

// === Arena growth ===

#[test]
fn test_large_document_spans_many_segments() {
    let pool = PoolAllocator::with_config(&PoolConfig::new(4, 64)).unwrap();
    let root = Node::object(Arena::new(pool.clone()).shared());
    for i in 0..500u32 {
        assert!(root.write_kv(&format!("key-{i:04}"), &(i as f64 + 0.25)));
    }
    assert!(root.arena().borrow().stats().segments > 4);
    assert!(pool.stats().heap_allocations > 0);

    assert_eq!(
        root.get("key-0321").and_then(|n| n.real()),
        Some(321.25)
    );
    let parsed: serde_json::Value = serde_json::from_slice(&root.to_json(0)).unwrap();
    assert_eq!(parsed.as_object().map(|m| m.len()), Some(500));
}

#[test]
fn test_oversized_string_value() {
    let config = PoolConfig {
        chunks: 2,
        chunk_size: 32,
        max_oversized: 1024,
    };
    let root = Node::object(Arena::with_config(&config).unwrap().shared());
    let long = "z".repeat(500);
    assert!(root.write_kv("long", long.as_str()));
    assert!(!root.write_kv("too long", "z".repeat(2000).as_str()));
    assert_eq!(root.get("long").map(|n| n.size()), Some(500));
    assert_eq!(root.arena().borrow().stats().oversized, 1);
}

#[test]
fn test_values_survive_arena_flush() {
    let root = array();
    for i in 0..5_000u32 {
        root.write_val(&i);
    }
    root.arena().borrow_mut().flush();
    assert_eq!(root.at(4_999).and_then(|n| n.uint32()), Some(4_999));
    assert_eq!(root.arena().borrow().stats().segments, 1);
}

// === Mutation ===

#[test]
fn test_add_built_subtrees() {
    let root = object();
    let list = Node::array(Rc::clone(root.arena()));
    write_vals!(list, 1, 2, 3);
    let mut keyed = list.clone();
    assert!(keyed.write_key("list"));
    assert!(root.add(keyed));

    let copy = root.get("list").unwrap();
    assert_eq!(copy.len(), 3);
    assert!(list.write_val(&4));
    assert_eq!(root.get("list").map(|n| n.len()), Some(4));
}

#[test]
fn test_add_empty_on_object_clears_sorted() {
    let root = object();
    root.write_kv("a", &1);
    assert!(root.sorted());
    {
        let mut child = root.add_empty().unwrap();
        child.write_key("0");
        child.write(&0);
    }
    assert!(!root.sorted());
    assert_eq!(root.get("0").and_then(|n| n.int32()), Some(0));
}

#[test]
fn test_add_borrowed_array() {
    let text = b"borrowed".to_vec();
    let root = Node::array(Arena::shared_default());
    assert!(root.add_borrowed(&text, Kind::String));
    assert!(!root.add_borrowed(b"{}", Kind::Object));
    assert_eq!(root.to_json(0), br#"["borrowed"]"#);
}

#[test]
fn test_update_and_erase_by_index() {
    let root = array();
    write_vals!(root, "a", "b", "c");
    let mut replacement = Node::new(Rc::clone(root.arena()));
    replacement.write(&Null);
    assert!(root.update_at(1, replacement));
    assert!(root.erase_at(0));
    assert!(!root.erase_at(5));
    assert_eq!(root.to_string(), r#"[null,"c"]"#);
}

#[test]
fn test_update_keeps_key() {
    let root = object();
    write_kv!(root, "a" => 1, "b" => 2);
    let mut replacement = Node::new(Rc::clone(root.arena()));
    replacement.write_pair("ignored", &true);
    assert!(root.update("a", replacement));
    assert!(!root.update("missing", Node::default()));
    assert_eq!(root.to_string(), r#"{"a":true,"b":2}"#);
}

#[test]
fn test_lifted_child_detaches() {
    let root = object();
    root.write_kv("v", &9);
    let mut lifted = root.get("v").unwrap();
    lifted.detach();
    let list = array();
    assert!(list.add(lifted));
    assert_eq!(list.to_string(), "[9]");
    assert_eq!(root.to_string(), r#"{"v":9}"#);
}

// === Serialization ===

#[test]
fn test_serialize_pretty() {
    let root = object();
    write_kv!(root, "a" => 1, "b" => "two");
    let list = Node::array(Rc::clone(root.arena()));
    write_vals!(list, true, Null);
    let mut keyed = list;
    keyed.write_key("c");
    root.add(keyed);

    let bytes = root.serialize(2).unwrap();
    let expected = "{\n  \"a\":1,\n  \"b\":\"two\",\n  \"c\":[\n    true,\n    null\n  ]\n}";
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), expected);
}

#[test]
fn test_serialize_spans_pool_chunks() {
    let pool = PoolAllocator::new(16, 16).unwrap();
    let root = Node::array(Arena::new(pool).shared());
    for i in 0..100u32 {
        root.write_val(&i);
    }
    let bytes = root.serialize(0).unwrap();
    assert_eq!(&bytes[..], root.to_json(0).as_slice());
    let parsed: Vec<u32> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed.len(), 100);
}

#[test]
fn test_built_tree_reparses_identically() {
    let root = object();
    write_kv!(root, "name" => "frugal", "count" => 3, "ratio" => 0.75, "on" => false);
    let printed = root.to_json(0);
    let reparsed = try_parse(&printed).unwrap();
    assert_eq!(reparsed.to_json(0), printed);
    assert_eq!(reparsed.get("ratio").and_then(|n| n.real()), Some(0.75));
}

// === Configuration ===

#[test]
fn test_engine_config_from_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{"pool":{"chunk_size":512},"parse":{"max_depth":64}}"#).unwrap();
    assert_eq!(config.pool.chunk_size, 512);
    assert_eq!(config.pool.chunks, 100);
    assert_eq!(config.parse.max_depth, Some(64));

    let arena = Arena::with_config(&config.pool).unwrap();
    assert_eq!(arena.stats().segments, 0);
}

#[test]
fn test_parser_from_engine_config() {
    let config: EngineConfig = serde_json::from_str(
        r#"{"pool":{"chunks":4,"chunk_size":64,"max_oversized":128},"parse":{"max_depth":2}}"#,
    )
    .unwrap();
    let parser = Parser::from_engine_config(&config).unwrap();
    assert_eq!(parser.config().max_depth, Some(2));

    let err = parser.parse(b"[[[1]]]").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DepthLimitExceeded);

    let root = parser.parse(br#"{"a":[1]}"#).unwrap();
    assert!(root.write_kv("b", &"built"));
    let pool = parser.arena().borrow_mut().pool().unwrap();
    assert_eq!(pool.subsize(), 64);
    assert_eq!(pool.size(), 4);
    assert_eq!(parser.arena().borrow().stats().segments, 1);

    assert!(!root.write_kv("big", &"x".repeat(200).as_str()));
}

#[test]
fn test_parser_from_engine_config_rejects_bad_pool() {
    let config = EngineConfig {
        pool: PoolConfig::new(0, 64),
        ..EngineConfig::default()
    };
    assert!(Parser::from_engine_config(&config).is_err());
}

#[test]
fn test_engine_config_defaults_round_trip() {
    let text = serde_json::to_string(&EngineConfig::default()).unwrap();
    let back: EngineConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, EngineConfig::default());
    let empty: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, EngineConfig::default());
}

// Integration tests for the deterministic chunk serializer: byte
// format discipline and round-trip execution through a fresh VM.

use std::rc::Rc;

use izi::compiler::compile_source;
use izi::config::Config;
use izi::serializer::{deserialize_chunk, serialize_chunk};
use izi::vm::Vm;

#[test]
fn round_tripping_a_chunk_preserves_its_observable_behavior() {
    let chunk = compile_source("var x = 2 + 3; print(x);", None, Config::default()).unwrap();
    let bytes = serialize_chunk(&chunk);

    assert_eq!(&bytes[0..4], b"IZB\0");
    assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);

    let restored = deserialize_chunk(&bytes).unwrap();
    let mut vm = Vm::new(Config::default());
    vm.run_chunk(Rc::new(restored)).unwrap();
}

#[test]
fn a_file_with_the_wrong_magic_is_rejected_before_running_anything() {
    let err = deserialize_chunk(b"NOPE\x01\x00\x00\x00").unwrap_err();
    assert_eq!(err.kind, izi::errors::ErrorKind::SerializerError);
}

#[test]
fn a_file_with_an_unsupported_version_is_rejected() {
    let mut bytes = b"IZB\0".to_vec();
    bytes.extend_from_slice(&99u32.to_le_bytes());
    let err = deserialize_chunk(&bytes).unwrap_err();
    assert_eq!(err.kind, izi::errors::ErrorKind::SerializerError);
}

#[test]
fn a_truncated_chunk_body_is_rejected_rather_than_panicking() {
    let chunk = compile_source("print(1);", None, Config::default()).unwrap();
    let mut bytes = serialize_chunk(&chunk);
    bytes.truncate(bytes.len() - 2);
    assert!(deserialize_chunk(&bytes).is_err());
}

#[test]
fn user_defined_functions_survive_a_round_trip() {
    let chunk = compile_source(
        "fn add(a, b) { return a + b; }\nprint(add(10, 32));\n",
        None,
        Config::default(),
    )
    .unwrap();
    let bytes = serialize_chunk(&chunk);
    let restored = deserialize_chunk(&bytes).unwrap();
    let mut vm = Vm::new(Config::default());
    vm.run_chunk(Rc::new(restored)).unwrap();
}

#[test]
fn classes_survive_a_round_trip() {
    let source = r#"
class Counter {
  var count;
  fn constructor(start) { this.count = start; }
  fn inc() { this.count = this.count + 1; return this.count; }
}
var c = Counter(10);
print(c.inc());
"#;
    let chunk = compile_source(source, None, Config::default()).unwrap();
    let bytes = serialize_chunk(&chunk);
    let restored = deserialize_chunk(&bytes).unwrap();
    let mut vm = Vm::new(Config::default());
    vm.run_chunk(Rc::new(restored)).unwrap();
}

//! Registry extension tests: custom tags flow through header parsing and
//! row decoding without changes to either.

use std::sync::Arc;

use textrows::{
    DecodeError, RowsError, ScanType, TextRows, TextRowsBuilder, TypeRegistry, Value,
};

fn decode_bool(raw: &[u8]) -> Result<Value, DecodeError> {
    match raw {
        b"0" | b"false" => Ok(Value::UInt8(0)),
        b"1" | b"true" => Ok(Value::UInt8(1)),
        [] => Err(DecodeError::Empty),
        [byte, ..] => Err(DecodeError::InvalidByte {
            byte: *byte,
            offset: 0,
        }),
    }
}

fn custom_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::with_builtins();
    registry.register("Bool", ScanType::UInt8, decode_bool);
    Arc::new(registry)
}

#[test]
fn test_custom_tag_decodes() {
    let input: &[u8] = b"id\tactive\nInt32\tBool\n1\ttrue\n2\t0\n";
    let mut rows = TextRowsBuilder::new()
        .registry(custom_registry())
        .build(input)
        .unwrap();

    assert_eq!(rows.column_type_scan_type(1), Some(ScanType::UInt8));
    assert_eq!(rows.column_type_database_type_name(1), Some("Bool"));

    let collected: Vec<Vec<Value>> = rows.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        collected,
        vec![
            vec![Value::Int32(1), Value::UInt8(1)],
            vec![Value::Int32(2), Value::UInt8(0)],
        ]
    );
}

#[test]
fn test_custom_tag_unknown_to_default_registry() {
    let input: &[u8] = b"id\tactive\nInt32\tBool\n1\ttrue\n";
    let mut rows = TextRows::new(input).unwrap();

    assert_eq!(rows.column_type_scan_type(1), Some(ScanType::Unsupported));
    assert!(matches!(
        rows.next_row().unwrap_err(),
        RowsError::UnsupportedType { index: 1, .. }
    ));
}

#[test]
fn test_custom_tag_inside_nullable() {
    let input: &[u8] = b"flag\nNullable(Bool)\n\\N\nfalse\n";
    let mut rows = TextRowsBuilder::new()
        .registry(custom_registry())
        .build(input)
        .unwrap();

    assert_eq!(rows.column_type_nullable(0), Some(true));
    assert_eq!(rows.next_row().unwrap(), Some(vec![Value::Null]));
    assert_eq!(rows.next_row().unwrap(), Some(vec![Value::UInt8(0)]));
    assert_eq!(rows.next_row().unwrap(), None);
}

#[test]
fn test_custom_decoder_fault_is_value_parse() {
    let input: &[u8] = b"flag\nBool\nmaybe\n";
    let mut rows = TextRowsBuilder::new()
        .registry(custom_registry())
        .build(input)
        .unwrap();

    match rows.next_row().unwrap_err() {
        RowsError::ValueParse { source, .. } => {
            assert_eq!(
                source,
                DecodeError::InvalidByte {
                    byte: b'm',
                    offset: 0
                }
            );
        }
        other => panic!("Expected ValueParse, got {:?}", other),
    }
}

#[test]
fn test_override_builtin_tag() {
    fn decode_loose_string(raw: &[u8]) -> Result<Value, DecodeError> {
        Ok(Value::String(String::from_utf8_lossy(raw).into_owned()))
    }

    let mut registry = TypeRegistry::with_builtins();
    registry.register("String", ScanType::String, decode_loose_string);

    let input: &[u8] = b"s\nString\n\"kept\"\n";
    let mut rows = TextRowsBuilder::new()
        .registry(Arc::new(registry))
        .build(input)
        .unwrap();

    // the override does not dequote
    assert_eq!(rows.next_row().unwrap(), Some(vec![Value::from("\"kept\"")]));
}

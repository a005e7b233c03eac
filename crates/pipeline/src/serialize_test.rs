//! Serialization contract tests

use serde_json::{json, Value};
use sluice_protocol::{Event, OutputFormat};

use super::serialize;

fn event(value: Value) -> Event {
    Event::parse(value).expect("test event must parse")
}

fn sample() -> Vec<Event> {
    vec![
        event(json!({
            "eventId": "evt-1",
            "clientId": "acme",
            "time": "2024-06-01T10:15:00Z",
            "action": "login"
        })),
        event(json!({
            "eventId": "evt-2",
            "clientId": "acme",
            "time": "2024-06-01T10:20:00+00:00",
            "params": [1, 2, 3]
        })),
    ]
}

#[test]
fn json_is_one_array_in_buffer_order() {
    let bytes = serialize(&sample(), OutputFormat::Json).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    assert!(text.starts_with('['));
    assert!(text.ends_with(']'));
    assert!(!text.ends_with('\n'));

    let decoded: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0]["eventId"], "evt-1");
    assert_eq!(decoded[1]["eventId"], "evt-2");
}

#[test]
fn json_round_trips_timestamps_verbatim() {
    let bytes = serialize(&sample(), OutputFormat::Json).unwrap();
    let decoded: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    // The +00:00 spelling survives; nothing reformats to Z
    assert_eq!(decoded[1]["time"], "2024-06-01T10:20:00+00:00");
}

#[test]
fn json_reencoding_is_byte_identical() {
    let events = sample();
    let bytes = serialize(&events, OutputFormat::Json).unwrap();
    let decoded: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    let reencoded: Vec<Event> = decoded.into_iter().map(event).collect();
    assert_eq!(bytes, serialize(&reencoded, OutputFormat::Json).unwrap());
}

#[test]
fn empty_buffer_encodes_as_empty_array() {
    let bytes = serialize(&[], OutputFormat::Json).unwrap();
    assert_eq!(&bytes[..], b"[]");
}

#[test]
fn jsonl_terminates_every_line() {
    let bytes = serialize(&sample(), OutputFormat::Jsonl).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    assert!(text.ends_with('\n'));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);

    for (line, expected_id) in lines.iter().zip(["evt-1", "evt-2"]) {
        let value: Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["eventId"], expected_id);
    }
}

#[test]
fn jsonl_reencoding_is_byte_identical() {
    let events = sample();
    let bytes = serialize(&events, OutputFormat::Jsonl).unwrap();
    let reencoded: Vec<Event> = std::str::from_utf8(&bytes)
        .unwrap()
        .lines()
        .map(|line| event(serde_json::from_str(line).unwrap()))
        .collect();
    assert_eq!(bytes, serialize(&reencoded, OutputFormat::Jsonl).unwrap());
}

#[test]
fn csv_header_is_the_sorted_key_union() {
    let events = vec![
        event(json!({
            "clientId": "acme",
            "time": "2024-06-01T10:15:00Z",
            "zebra": 1
        })),
        event(json!({
            "clientId": "acme",
            "time": "2024-06-01T10:16:00Z",
            "action": "login"
        })),
    ];
    let bytes = serialize(&events, OutputFormat::Csv).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    let mut rows = text.split("\r\n");

    assert_eq!(rows.next(), Some("action,clientId,time,zebra"));
    // Missing fields are empty cells
    assert_eq!(rows.next(), Some(",acme,2024-06-01T10:15:00Z,1"));
    assert_eq!(rows.next(), Some("login,acme,2024-06-01T10:16:00Z,"));
    assert_eq!(rows.next(), Some("")); // trailing CRLF
}

#[test]
fn csv_encodes_nested_values_as_compact_json() {
    let events = vec![event(json!({
        "clientId": "acme",
        "time": "2024-06-01T10:15:00Z",
        "params": [1, 2],
        "detail": {"k": "v"}
    }))];
    let bytes = serialize(&events, OutputFormat::Csv).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    // Nested JSON contains commas and quotes, so the cells are quoted
    // with doubled inner quotes
    assert!(text.contains("\"[1,2]\""));
    assert!(text.contains("\"{\"\"k\"\":\"\"v\"\"}\""));
}

#[test]
fn csv_quotes_cells_with_separators() {
    let events = vec![event(json!({
        "clientId": "acme",
        "time": "2024-06-01T10:15:00Z",
        "note": "hello, \"world\"\nbye"
    }))];
    let bytes = serialize(&events, OutputFormat::Csv).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    assert!(text.contains("\"hello, \"\"world\"\"\nbye\""));
}

#[test]
fn csv_null_values_are_empty_cells() {
    let events = vec![event(json!({
        "clientId": "acme",
        "time": "2024-06-01T10:15:00Z",
        "maybe": null
    }))];
    let bytes = serialize(&events, OutputFormat::Csv).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert_eq!(
        text.split("\r\n").next(),
        Some("clientId,maybe,time")
    );
    assert!(text.contains("acme,,2024-06-01T10:15:00Z"));
}

use super::*;
use serde_json::json;

#[test]
fn test_add_listener_wire_format() {
    let msg = ClientMessage::add_listener(
        ListenerId(7),
        EventType::new("my.EventType"),
        json!({"x": 1}),
    );

    let wire: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
    assert_eq!(
        wire,
        json!({
            "type": "addListener",
            "data": {
                "eventType": {"id": "my.EventType", "params": {}},
                "eventData": {"data": {"x": 1}, "listenerId": 7}
            }
        })
    );
}

#[test]
fn test_add_listener_null_data() {
    let msg = ClientMessage::add_listener(ListenerId(0), EventType::new("a.Event"), Value::Null);
    let wire: Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
    assert_eq!(wire["data"]["eventData"], json!({"data": null, "listenerId": 0}));
}

#[test]
fn test_decode_event() {
    let text = r#"{"type":"event","data":{"event":"my.EventType","source":"S","data":"SD","eventData":{"listenerId":3,"data":{"x":1}}}}"#;

    let msg = decode_server_message(text).unwrap();
    assert_eq!(
        msg,
        ServerMessage::Event(EventMessage {
            listener_id: Some(ListenerId(3)),
            event: json!("my.EventType"),
            source: json!("S"),
            source_data: json!("SD"),
            listener_data: json!({"x": 1}),
        })
    );
}

#[test]
fn test_decode_event_missing_fields() {
    let msg = decode_server_message(r#"{"type":"event","data":{"event":{"name":"e"}}}"#).unwrap();
    match msg {
        ServerMessage::Event(event) => {
            assert_eq!(event.listener_id, None);
            assert_eq!(event.event, json!({"name": "e"}));
            assert_eq!(event.source, Value::Null);
            assert_eq!(event.source_data, Value::Null);
            assert_eq!(event.listener_data, Value::Null);
        }
        other => panic!("Expected event, got {:?}", other),
    }
}

#[test]
fn test_decode_event_without_data() {
    let msg = decode_server_message(r#"{"type":"event"}"#).unwrap();
    assert_eq!(msg, ServerMessage::Event(EventMessage::default()));
}

#[test]
fn test_decode_event_with_mismatched_shapes() {
    // data is a string, eventData is an array, listenerId is a string
    for text in [
        r#"{"type":"event","data":"oops"}"#,
        r#"{"type":"event","data":{"eventData":[1,2]}}"#,
        r#"{"type":"event","data":{"eventData":{"listenerId":"3"}}}"#,
        r#"{"type":"event","data":{"eventData":{"listenerId":-1}}}"#,
        r#"{"type":"event","data":{"eventData":{"listenerId":1.5}}}"#,
    ] {
        match decode_server_message(text).unwrap() {
            ServerMessage::Event(event) => assert_eq!(event.listener_id, None, "{}", text),
            other => panic!("Expected event for {}, got {:?}", text, other),
        }
    }
}

#[test]
fn test_decode_other_types() {
    assert_eq!(
        decode_server_message(r#"{"type":"pong"}"#).unwrap(),
        ServerMessage::Other(Some("pong".to_string()))
    );
    assert_eq!(
        decode_server_message(r#"{"data":{}}"#).unwrap(),
        ServerMessage::Other(None)
    );
    assert_eq!(
        decode_server_message(r#"{"type":42}"#).unwrap(),
        ServerMessage::Other(None)
    );
    assert_eq!(decode_server_message("[1,2,3]").unwrap(), ServerMessage::Other(None));
    assert_eq!(decode_server_message("\"event\"").unwrap(), ServerMessage::Other(None));
}

#[test]
fn test_decode_malformed_json() {
    let result = decode_server_message("{not json");
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
    assert!(result.unwrap_err().to_string().starts_with("malformed message"));
}

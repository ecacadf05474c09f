use agentchat::api::streaming::parse_frame;
use agentchat::api::{decode_events, with_chunk_timeout, ByteStream, FrameDecoder};
use agentchat::error::ChatError;
use agentchat::models::ProtocolEvent;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::time::Duration;

fn sample_body() -> String {
    [
        r#"data: {"type": "start"}"#,
        "",
        r#"data: {"type": "token", "content": "héllo "}"#,
        ": keep-alive comment",
        r#"data: {"type": "tool_call_start", "tool_name": "browser_navigate", "tool_args": {"url": "https://example.com"}, "tool_call_id": "call_1"}"#,
        r#"data: {"type": "tool_result", "tool_name": "browser_navigate"}"#,
        r#"data: {"type": "ping"}"#,
        r#"data: {"type": "token", "content": "世界"}"#,
        r#"data: {"type": "end"}"#,
        "",
    ]
    .join("\n")
}

fn decode_all(chunks: &[&[u8]]) -> Vec<ProtocolEvent> {
    let mut decoder = FrameDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.push(chunk));
    }
    events.extend(decoder.finish());
    events
}

#[test]
fn test_decode_single_chunk() {
    let body = sample_body();
    let events = decode_all(&[body.as_bytes()]);

    let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec!["start", "token", "tool_call_start", "tool_result", "ping", "token", "end"]
    );
    assert_eq!(
        events[1],
        ProtocolEvent::Token {
            content: "héllo ".to_string()
        }
    );
}

#[test]
fn test_decoding_is_independent_of_chunk_boundaries() {
    let body = sample_body();
    let bytes = body.as_bytes();
    let expected = decode_all(&[bytes]);

    for split in 0..=bytes.len() {
        let (left, right) = bytes.split_at(split);
        assert_eq!(decode_all(&[left, right]), expected, "split at byte {}", split);
    }

    let byte_by_byte: Vec<&[u8]> = bytes.chunks(1).collect();
    assert_eq!(decode_all(&byte_by_byte), expected);

    let uneven: Vec<&[u8]> = bytes.chunks(7).collect();
    assert_eq!(decode_all(&uneven), expected);
}

#[test]
fn test_partial_line_waits_for_next_chunk() {
    let mut decoder = FrameDecoder::new();

    let events = decoder.push(br#"data: {"type": "tok"#);
    assert!(events.is_empty());
    assert!(decoder.has_pending());

    let events = decoder.push(b"en\", \"content\": \"hi\"}\n");
    assert_eq!(
        events,
        vec![ProtocolEvent::Token {
            content: "hi".to_string()
        }]
    );
    assert!(!decoder.has_pending());
}

#[test]
fn test_malformed_frame_is_skipped() {
    let body = concat!(
        "data: {\"type\": \"token\", \"content\": \"a\"}\n",
        "data: {not json at all\n",
        "data: {\"content\": \"no type\"}\n",
        "data: {\"type\": \"token\", \"content\": \"b\"}\n",
    );

    let events = decode_all(&[body.as_bytes()]);
    assert_eq!(
        events,
        vec![
            ProtocolEvent::Token {
                content: "a".to_string()
            },
            ProtocolEvent::Token {
                content: "b".to_string()
            },
        ]
    );
}

#[test]
fn test_unknown_types_and_other_fields_are_ignored() {
    let body = concat!(
        "event: message\n",
        "id: 42\n",
        "data:{\"type\": \"start\"}\n",
        "data: {\"type\": \"thinking\", \"content\": \"hmm\"}\n",
        "data: {\"type\": \"end\"}\n",
    );

    // Only the literal `data: ` prefix (with the space) marks a frame.
    let events = decode_all(&[body.as_bytes()]);
    assert_eq!(events, vec![ProtocolEvent::End]);
}

#[test]
fn test_crlf_line_endings() {
    let body = "data: {\"type\": \"start\"}\r\n\r\ndata: {\"type\": \"end\"}\r\n";
    let events = decode_all(&[body.as_bytes()]);
    assert_eq!(events, vec![ProtocolEvent::Start, ProtocolEvent::End]);
}

#[test]
fn test_finish_decodes_unterminated_last_line() {
    let mut decoder = FrameDecoder::new();
    assert!(decoder.push(br#"data: {"type": "end"}"#).is_empty());
    assert_eq!(decoder.finish(), vec![ProtocolEvent::End]);
    assert!(decoder.finish().is_empty());
}

#[test]
fn test_parse_tool_call_fields() {
    let event = parse_frame(
        &json!({
            "type": "tool_call_complete",
            "tool_name": "browser_click",
            "tool_args": null
        })
        .to_string(),
    )
    .unwrap();

    match event {
        ProtocolEvent::ToolCallComplete {
            name,
            args,
            call_id,
        } => {
            assert_eq!(name, "browser_click");
            assert!(args.is_empty());
            assert_eq!(call_id, None);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_call_id_accepts_numbers_and_strings() {
    let call_id = |raw: &str| match parse_frame(&format!(
        r#"{{"type": "tool_call_start", "tool_name": "t", "tool_args": {{}}, "tool_call_id": {}}}"#,
        raw
    ))
    .unwrap()
    {
        ProtocolEvent::ToolCallStart { call_id, .. } => call_id,
        other => panic!("unexpected event: {:?}", other),
    };

    assert_eq!(call_id("17"), Some("17".to_string()));
    assert_eq!(call_id(r#""call_abc""#), Some("call_abc".to_string()));
    assert_eq!(call_id("null"), None);
    assert_eq!(call_id(r#""""#), None);
}

#[test]
fn test_parse_error_frame() {
    let event = parse_frame(r#"{"type": "error", "error": "model unavailable"}"#).unwrap();
    assert_eq!(
        event,
        ProtocolEvent::Error {
            message: "model unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn test_decode_events_over_a_stream() {
    let chunks: Vec<agentchat::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"data: {\"type\": \"start\"}\ndata: {\"type\": \"tok")),
        Ok(Bytes::from_static(b"en\", \"content\": \"x\"}\n")),
        Ok(Bytes::from_static(b"data: {\"type\": \"end\"}")),
    ];

    let events: Vec<ProtocolEvent> = decode_events(stream::iter(chunks))
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            ProtocolEvent::Start,
            ProtocolEvent::Token {
                content: "x".to_string()
            },
            ProtocolEvent::End,
        ]
    );
}

#[tokio::test]
async fn test_decode_events_stops_after_transport_error() {
    let chunks: Vec<agentchat::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"data: {\"type\": \"start\"}\n")),
        Err(ChatError::Transport("connection reset".to_string())),
        Ok(Bytes::from_static(b"data: {\"type\": \"end\"}\n")),
    ];

    let results: Vec<agentchat::Result<ProtocolEvent>> =
        decode_events(stream::iter(chunks)).collect().await;

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Ok(ProtocolEvent::Start)));
    assert!(matches!(results[1], Err(ChatError::Transport(_))));
}

#[tokio::test]
async fn test_chunk_timeout_ends_a_silent_body() {
    let body: ByteStream = Box::pin(stream::pending::<agentchat::Result<Bytes>>());
    let mut body = with_chunk_timeout(body, Duration::from_millis(20));

    assert!(matches!(body.next().await, Some(Err(ChatError::Timeout(_)))));
    assert!(body.next().await.is_none());
}

#[tokio::test]
async fn test_chunk_timeout_passes_chunks_through() {
    let chunks: Vec<agentchat::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b": keep-alive\n")),
        Ok(Bytes::from_static(b"data: {\"type\": \"end\"}\n")),
    ];
    let body: ByteStream = Box::pin(stream::iter(chunks));

    let events: Vec<agentchat::Result<ProtocolEvent>> =
        decode_events(with_chunk_timeout(body, Duration::from_secs(1)))
            .collect()
            .await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Ok(ProtocolEvent::End)));
}

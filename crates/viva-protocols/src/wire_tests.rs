use super::*;

#[test]
fn test_setup_envelope_shape() {
    let msg = ClientMessage::Setup(Setup {
        model: "models/gemini-2.0-flash-live-001".to_string(),
        generation_config: Some(GenerationConfig {
            temperature: Some(0.5),
            response_modalities: Some(vec!["AUDIO".to_string()]),
            ..Default::default()
        }),
        system_instruction: Some(Content::text("system", "You are an interviewer.")),
    });

    let json = serde_json::to_value(&msg).unwrap();
    assert!(json.get("setup").is_some());
    assert_eq!(json["setup"]["model"], "models/gemini-2.0-flash-live-001");
    assert_eq!(json["setup"]["generationConfig"]["temperature"], 0.5);
    assert_eq!(
        json["setup"]["systemInstruction"]["parts"][0]["text"],
        "You are an interviewer."
    );
    // Unset options must not appear on the wire
    assert!(json["setup"]["generationConfig"].get("topK").is_none());
}

#[test]
fn test_realtime_input_envelope() {
    let msg = ClientMessage::RealtimeInput(RealtimeInput {
        media_chunks: vec![MediaChunk {
            mime_type: "audio/pcm".to_string(),
            data: "AAAA".to_string(),
        }],
    });

    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm");
    assert_eq!(json["realtimeInput"]["mediaChunks"][0]["data"], "AAAA");
}

#[test]
fn test_client_content_envelope() {
    let msg = ClientMessage::ClientContent(ClientContent {
        turns: vec![Content::text("user", "I led a migration project.")],
        turn_complete: true,
    });

    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["clientContent"]["turnComplete"], true);
    assert_eq!(json["clientContent"]["turns"][0]["role"], "user");
}

#[test]
fn test_parse_setup_complete() {
    let msg: ServerMessage = serde_json::from_str(r#"{"setupComplete":true}"#).unwrap();
    assert!(msg.setup_complete.is_some());
    assert!(msg.server_content.is_none());

    // Object-valued acknowledgement parses too
    let msg: ServerMessage = serde_json::from_str(r#"{"setupComplete":{}}"#).unwrap();
    assert!(msg.setup_complete.is_some());
}

#[test]
fn test_parse_server_content_text() {
    let raw = r#"{"serverContent":{"modelTurn":{"parts":[{"text":"Hello"}]},"turnComplete":true}}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();

    let content = msg.server_content.unwrap();
    assert!(content.turn_complete);
    let turn = content.model_turn.unwrap();
    match &turn.parts[0] {
        Part::Text { text } => assert_eq!(text, "Hello"),
        other => panic!("expected text part, got {:?}", other),
    }
}

#[test]
fn test_parse_server_content_audio() {
    let raw = r#"{"serverContent":{"modelTurn":{"parts":[{"inlineData":{"mimeType":"audio/pcm","data":"UklGR"}}]}}}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();

    let turn = msg.server_content.unwrap().model_turn.unwrap();
    match &turn.parts[0] {
        Part::InlineData { inline_data } => {
            assert_eq!(inline_data.mime_type, "audio/pcm");
            assert_eq!(inline_data.data, "UklGR");
        }
        other => panic!("expected inline data part, got {:?}", other),
    }
}

#[test]
fn test_parse_tool_call() {
    let raw = r#"{"toolCall":{"functionCalls":[{"name":"record_answer","args":{"score":4}}]}}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();

    let calls = msg.tool_call.unwrap().function_calls;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "record_answer");
    assert_eq!(calls[0].args["score"], 4);
}

#[test]
fn test_parse_tool_call_cancellation() {
    let raw = r#"{"toolCallCancellation":{"ids":["call-1","call-2"]}}"#;
    let msg: ServerMessage = serde_json::from_str(raw).unwrap();
    assert_eq!(msg.tool_call_cancellation.unwrap().ids.len(), 2);
}

#[test]
fn test_malformed_frame_is_error() {
    let result: Result<ServerMessage, _> = serde_json::from_str("{nope");
    assert!(result.is_err());
}

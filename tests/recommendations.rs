mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tryon_studio_core::generation::{
    Candidate, ContentPart, GenerationOperation, GenerationResponse, ThinkingHints,
};
use tryon_studio_core::studio::parse_recommendations;
use tryon_studio_core::{ErrorKind, StudioError};

#[test]
fn parses_fenced_and_bare_json() {
    assert_eq!(
        parse_recommendations("```json\n{\"a\": 1}\n```").expect("fenced json should parse"),
        json!({"a": 1})
    );
    assert_eq!(
        parse_recommendations("{\"a\": 1}").expect("bare json should parse"),
        json!({"a": 1})
    );
    assert_eq!(
        parse_recommendations("```JSON\n[{\"look\": \"smart casual\"}]\n```")
            .expect("upper-case tag should parse"),
        json!([{"look": "smart casual"}])
    );
}

#[test]
fn plain_text_is_a_parse_error() {
    let err = parse_recommendations("not json").expect_err("plain text should fail");
    assert!(matches!(err, StudioError::Parse { ref raw, .. } if raw == "not json"));
    assert_eq!(err.kind(), ErrorKind::Provider);
}

#[test]
fn recommend_uses_text_model_with_low_thinking() {
    let transport = ScriptedTransport::with_responses(vec![Ok(GenerationResponse {
        text: Some(String::from("```json\n{\"outfits\": [\"navy blazer\"]}\n```")),
        candidates: Vec::new(),
    })]);
    let studio = studio_with(&transport);

    let value = studio
        .recommend_outfits("autumn wedding, outdoor, warm tones")
        .expect("recommendations should parse");
    assert_eq!(value, json!({"outfits": ["navy blazer"]}));

    let seen = transport.take_seen();
    assert_eq!(seen.len(), 1);
    let (model, request) = &seen[0];
    assert_eq!(model, TEXT_MODEL);
    assert_eq!(request.operation, GenerationOperation::Recommendation);
    assert_eq!(
        request.inputs,
        vec![ContentPart::Text(String::from(
            "autumn wedding, outdoor, warm tones"
        ))]
    );
    assert!(request.hints.response_modalities.is_empty());
    assert_eq!(
        request.hints.thinking,
        Some(ThinkingHints {
            include_thoughts: true,
            level: String::from("LOW"),
        })
    );
}

#[test]
fn text_parts_are_joined_when_no_direct_text() {
    let transport = ScriptedTransport::with_responses(vec![Ok(GenerationResponse {
        text: None,
        candidates: vec![
            Candidate {
                parts: vec![text_part("{\"outfits\":"), text_part("[1, 2]")],
            },
            Candidate {
                parts: vec![text_part("}")],
            },
        ],
    })]);
    let studio = studio_with(&transport);

    let value = studio
        .recommend_outfits("office")
        .expect("joined text should parse");
    assert_eq!(value, json!({"outfits": [1, 2]}));
}

#[test]
fn missing_text_is_an_empty_result() {
    let transport = ScriptedTransport::default();
    let studio = studio_with(&transport);

    let err = studio
        .recommend_outfits("office")
        .expect_err("no text should fail");
    assert!(matches!(
        err,
        StudioError::EmptyGenerationResult {
            operation: GenerationOperation::Recommendation
        }
    ));
}

#[test]
fn blank_context_is_rejected() {
    let transport = ScriptedTransport::default();
    let studio = studio_with(&transport);

    let err = studio
        .recommend_outfits(" \n ")
        .expect_err("blank context should fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(transport.take_seen().is_empty());
}

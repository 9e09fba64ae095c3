use serde_json::Value;

use super::TryOnStudio;
use crate::error::{StudioError, StudioResult};
use crate::generation::{response_text, GenerationOperation};

const FENCE: &str = "```";

impl TryOnStudio {
    pub fn recommend_outfits(&self, styling_context: &str) -> StudioResult<Value> {
        if styling_context.trim().is_empty() {
            return Err(StudioError::InvalidRequest(String::from(
                "styling context must not be empty",
            )));
        }
        let response = self.client.recommend(styling_context)?;
        let raw = response_text(&response).ok_or(StudioError::EmptyGenerationResult {
            operation: GenerationOperation::Recommendation,
        })?;
        parse_recommendations(raw.as_str())
    }
}

/// Recovers a JSON value from model text that may be wrapped in a markdown
/// code fence. Only syntax is checked, not shape.
pub fn parse_recommendations(raw: &str) -> StudioResult<Value> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str(cleaned).map_err(|source| {
        tracing::warn!(error = %source, "recommendations response is not valid JSON");
        StudioError::Parse {
            raw: raw.to_string(),
            source,
        }
    })
}

/// First non-empty fence segment wins, even when later segments follow.
/// A leading `json` tag (any case) drops that segment's first line.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed;
    }
    let Some(segment) = trimmed
        .split(FENCE)
        .map(str::trim)
        .find(|segment| !segment.is_empty())
    else {
        return trimmed;
    };
    let tagged = segment
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("json"));
    if tagged {
        segment.split_once('\n').map(|(_, rest)| rest).unwrap_or("")
    } else {
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_json_tagged_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```JSON\n[1]\n```  "), "[1]");
    }

    #[test]
    fn untagged_fence_uses_segment_verbatim() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn first_non_empty_segment_wins() {
        let raw = "```\n{\"first\":true}\n```\nSome trailing commentary";
        assert_eq!(strip_code_fence(raw), "{\"first\":true}");
    }

    #[test]
    fn tag_without_newline_leaves_nothing() {
        assert_eq!(strip_code_fence("```json```"), "");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
        assert_eq!(
            strip_code_fence("Here you go: ```json\n{}\n```"),
            "Here you go: ```json\n{}\n```"
        );
    }

    #[test]
    fn parse_recommendations_accepts_fenced_and_bare_json() {
        assert_eq!(
            parse_recommendations("```json\n{\"a\":1}\n```").expect("fenced json should parse"),
            json!({"a": 1})
        );
        assert_eq!(
            parse_recommendations("{\"a\":1}").expect("bare json should parse"),
            json!({"a": 1})
        );
    }

    #[test]
    fn parse_failure_keeps_raw_text() {
        let err = parse_recommendations("not json").expect_err("plain text should fail");
        match err {
            StudioError::Parse { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

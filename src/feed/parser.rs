use serde::Deserialize;
use thiserror::Error;

use crate::model::RawStory;

/// Errors from feed body extraction.
///
/// Extraction is all-or-nothing: one malformed element aborts the whole
/// batch. Cloneable so a cached failure can be handed to late subscribers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not the expected `{"response": {"results": [...]}}`
    /// shape, or an element is missing a required field.
    #[error("malformed feed response: {0}")]
    MalformedTopLevel(String),
}

#[derive(Deserialize)]
struct Envelope {
    response: ResponseBody,
}

#[derive(Deserialize)]
struct ResponseBody {
    results: Vec<RawStory>,
}

/// Decode a raw response body into wire records, in source order.
///
/// An empty, whitespace-only, or literal `null` body is an empty feed —
/// a valid state, not an error. Anything else must match the envelope shape
/// exactly; a single element missing a required key (or not being an object)
/// fails the whole batch with [`ParseError::MalformedTopLevel`]. Unknown
/// extra keys on elements are ignored.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawStory>, ParseError> {
    let text =
        std::str::from_utf8(body).map_err(|e| ParseError::MalformedTopLevel(e.to_string()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        tracing::debug!("empty feed body, treating as empty result set");
        return Ok(Vec::new());
    }

    let envelope: Envelope =
        serde_json::from_str(trimmed).map_err(|e| ParseError::MalformedTopLevel(e.to_string()))?;

    Ok(envelope.response.results)
}

//! Extraction response parser
//!
//! Pulls the extraction JSON out of a raw model response and parses it into
//! [`FriExtraction`] records.

use crate::error::{Error, Result};
use crate::types::FriExtraction;

/// Extract the JSON part of a response
///
/// Priority:
/// 1. a ```json ... ``` block
/// 2. the outermost `{...}` object or `[...]` array, whichever starts first
///
/// # Examples
/// ```
/// use fri_verdict_common::extract_json;
///
/// let response = "Result:\n{\"report\": {}}\nDone.";
/// assert_eq!(extract_json(response).unwrap(), "{\"report\": {}}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + "```json".len();
        if let Some(end_offset) = response[start..].find("```") {
            return Ok(response[start..start + end_offset].trim());
        }
    }

    let start = response.find(['{', '[']);
    if let Some(start) = start {
        let close = if response[start..].starts_with('{') { '}' } else { ']' };
        if let Some(end) = response.rfind(close) {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("no JSON found in response".into()))
}

/// Parse one extraction record from a response
pub fn parse_extraction_response(response: &str) -> Result<FriExtraction> {
    let json = extract_json(response)?;
    serde_json::from_str(json).map_err(|e| Error::Parse(format!("extraction JSON: {}", e)))
}

/// Parse a response holding either one record or an array of records
pub fn parse_extractions(response: &str) -> Result<Vec<FriExtraction>> {
    let json = extract_json(response)?;
    if json.starts_with('[') {
        serde_json::from_str(json).map_err(|e| Error::Parse(format!("extraction JSON array: {}", e)))
    } else {
        parse_extraction_response(json).map(|record| vec![record])
    }
}

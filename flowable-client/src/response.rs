//! Request bodies, response classification and error message extraction.

use crate::error::{ClientError, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields Flowable uses for the human readable part of an error body.
const MESSAGE_FIELDS: [&str; 3] = ["message", "errorMessage", "exception"];

/// How many closing braces to try when trimming a corrupted error body.
const MAX_BOUNDARY_ATTEMPTS: usize = 32;

/// Body of a POST or PUT request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON.
    Json(Value),
    /// Sent verbatim, without JSON encoding.
    Raw(String),
}

impl RequestBody {
    /// Serialize any value into a JSON body.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for RequestBody {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

/// A successful response, classified by status and content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 204, or a success with an empty body.
    NoContent,
    /// A JSON document.
    Json(Value),
    /// Any non-JSON payload (images, XML, ...), unparsed.
    Raw {
        /// The `Content-Type` the server reported.
        content_type: String,
        /// The body exactly as received.
        bytes: Bytes,
    },
}

impl ApiResponse {
    /// Classify a success response from its content type and body.
    pub(crate) fn classify(status: u16, content_type: Option<&str>, body: Bytes) -> Result<Self> {
        if status == 204 || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::NoContent);
        }

        match content_type {
            Some(ct) if is_json_content_type(ct) => Ok(Self::Json(serde_json::from_slice(&body)?)),
            Some(ct) => Ok(Self::Raw {
                content_type: ct.to_string(),
                bytes: body,
            }),
            // No content type: JSON if it parses, raw otherwise.
            None => match serde_json::from_slice(&body) {
                Ok(value) => Ok(Self::Json(value)),
                Err(_) => Ok(Self::Raw {
                    content_type: "application/octet-stream".to_string(),
                    bytes: body,
                }),
            },
        }
    }

    /// Whether the server answered without a body.
    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// The JSON value, with `NoContent` reported as `true`.
    ///
    /// # Errors
    ///
    /// Returns an error for raw (non-JSON) payloads.
    pub fn into_json(self) -> Result<Value> {
        match self {
            Self::Json(value) => Ok(value),
            Self::NoContent => Ok(Value::Bool(true)),
            Self::Raw { content_type, .. } => Err(ClientError::InvalidResponse(format!(
                "expected JSON, got {}",
                content_type
            ))),
        }
    }

    /// Deserialize the JSON payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_json()?)?)
    }

    /// The raw body bytes. JSON payloads are re-serialized.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            Self::Raw { bytes, .. } => Ok(bytes),
            Self::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
            Self::NoContent => Ok(Bytes::new()),
        }
    }
}

/// Envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Value> {
    /// Items of this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Total number of matching items.
    #[serde(default)]
    pub total: u64,
    /// Index of the first item.
    #[serde(default)]
    pub start: u64,
    /// Number of items in this page.
    #[serde(default)]
    pub size: u64,
    /// Sort field, if the server echoed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Sort order, if the server echoed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl<T> Page<T> {
    /// Take the first item, if any.
    pub fn into_first(self) -> Option<T> {
        self.data.into_iter().next()
    }

    /// Whether the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Whether a `Content-Type` header value denotes JSON.
pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Pull a readable message out of an error response body.
///
/// Some Flowable versions splice a serializer diagnostic into deeply nested
/// JSON, so the body is parsed leniently before giving up and returning the
/// raw text.
pub(crate) fn extract_error_message(body: &str, reason: Option<&str>) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.unwrap_or("Unknown error").to_string();
    }

    if let Some(message) = parse_lenient(trimmed).as_ref().and_then(message_field) {
        return message;
    }
    if let Some(message) = scan_message_field(trimmed) {
        return message;
    }

    trimmed.to_string()
}

fn message_field(value: &Value) -> Option<String> {
    MESSAGE_FIELDS
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// Parse the body, or the longest leading JSON object it contains.
fn parse_lenient(body: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }

    // First complete value, ignoring trailing diagnostic text.
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    if let Some(Ok(value)) = stream.next() {
        return Some(value);
    }

    body.rmatch_indices('}')
        .take(MAX_BOUNDARY_ATTEMPTS)
        .find_map(|(idx, _)| serde_json::from_str::<Value>(&body[..=idx]).ok())
}

/// Find `"message": "..."` style pairs in text that is not valid JSON.
fn scan_message_field(body: &str) -> Option<String> {
    MESSAGE_FIELDS.iter().find_map(|field| {
        let key = format!("\"{}\"", field);
        body.match_indices(&key).find_map(|(idx, _)| {
            let rest = body[idx + key.len()..].trim_start();
            let rest = rest.strip_prefix(':')?.trim_start();
            serde_json::Deserializer::from_str(rest)
                .into_iter::<String>()
                .next()?
                .ok()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_no_content() {
        let response = ApiResponse::classify(204, None, Bytes::new()).unwrap();
        assert!(response.is_no_content());
        assert_eq!(response.into_json().unwrap(), Value::Bool(true));

        let response =
            ApiResponse::classify(200, Some("application/json"), Bytes::from_static(b"  "))
                .unwrap();
        assert!(response.is_no_content());
    }

    #[test]
    fn test_classify_json() {
        let body = Bytes::from_static(br#"{"id":"dep-1"}"#);
        let response =
            ApiResponse::classify(201, Some("application/json;charset=UTF-8"), body).unwrap();
        assert_eq!(response, ApiResponse::Json(json!({"id": "dep-1"})));
    }

    #[test]
    fn test_classify_raw_keeps_bytes() {
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]);
        let response = ApiResponse::classify(200, Some("image/png"), png.clone()).unwrap();
        match response {
            ApiResponse::Raw {
                content_type,
                bytes,
            } => {
                assert_eq!(content_type, "image/png");
                assert_eq!(bytes, png);
            }
            other => panic!("Expected raw response, got {:?}", other),
        }
    }

    #[test]
    fn test_json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("Application/JSON; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("application/xml"));
        assert!(!is_json_content_type("text/plain"));
    }

    #[test]
    fn test_raw_into_json_fails() {
        let response = ApiResponse::Raw {
            content_type: "text/xml".to_string(),
            bytes: Bytes::from_static(b"<definitions/>"),
        };
        assert!(matches!(
            response.into_json(),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_page_defaults_missing_data() {
        let page: Page = serde_json::from_value(json!({"total": 0})).unwrap();
        assert!(page.is_empty());
        assert!(page.into_first().is_none());
    }

    #[test]
    fn test_extract_message_field_order() {
        let body = r#"{"message":"Not found","exception":"Could not find a task with id '1'."}"#;
        assert_eq!(extract_error_message(body, Some("Not Found")), "Not found");

        let body = r#"{"errorMessage":"Variable 'x' is not present"}"#;
        assert_eq!(
            extract_error_message(body, None),
            "Variable 'x' is not present"
        );

        let body = r#"{"exception":"Boom"}"#;
        assert_eq!(extract_error_message(body, None), "Boom");
    }

    #[test]
    fn test_extract_message_trailing_diagnostic() {
        let body = r#"{"message":"Bad request","exception":"Too deep"}Document nesting depth (1001) exceeds the maximum allowed (1000)"#;
        assert_eq!(extract_error_message(body, None), "Bad request");
    }

    #[test]
    fn test_extract_message_diagnostic_inside_nesting() {
        let body = r#"{"message":"Internal server error","data":{"children":[{"children":[Document nesting depth (1001) exceeds the maximum allowed"#;
        assert_eq!(
            extract_error_message(body, None),
            "Internal server error"
        );
    }

    #[test]
    fn test_extract_message_falls_back_to_raw_text() {
        assert_eq!(
            extract_error_message("  Gateway exploded \n", None),
            "Gateway exploded"
        );
        assert_eq!(extract_error_message("", Some("Bad Gateway")), "Bad Gateway");
        assert_eq!(extract_error_message("{\"id\":1}", None), "{\"id\":1}");
    }
}

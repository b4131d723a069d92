use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HTTP/[0-9]\.[0-9] ([0-9]{3})").expect("status line pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("Response error: {}", display_status(.status))]
    HttpStatus { status: Option<u16> },

    #[error("Empty response.")]
    EmptyBody,

    #[error("Error decoding response.")]
    Json(#[from] serde_json::Error),

    #[error("Error decoding response.")]
    Falsy,
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "Error".to_owned(), |code| code.to_string())
}

/// A complete HTTP response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code, `None` when the status line could not be read.
    pub status: Option<u16>,
    /// Header names mapped to their last value.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Parse a raw HTTP response (status line, headers, blank line, body).
    ///
    /// Informational `1xx` blocks that some servers send before the real
    /// response (`100 Continue`) are skipped. Header lines without a `": "`
    /// separator are ignored.
    pub fn from_raw(raw: &str) -> Self {
        let mut rest = raw;
        loop {
            let (head, body) = rest.split_once("\r\n\r\n").unwrap_or((rest, ""));
            let mut lines = head.split("\r\n");
            let status = lines.next().and_then(parse_status_line);

            if matches!(status, Some(100..=199)) {
                rest = body;
                continue;
            }

            let headers = lines
                .filter_map(|line| line.split_once(": "))
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect();
            return Self {
                status,
                headers,
                body: body.to_owned(),
            };
        }
    }
}

/// Free-function form of [`HttpResponse::from_raw`].
pub fn parse_raw_response(raw: &str) -> HttpResponse {
    HttpResponse::from_raw(raw)
}

fn parse_status_line(line: &str) -> Option<u16> {
    STATUS_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|code| code.as_str().parse().ok())
}

/// Check the status and decode the JSON body of a CRM response.
pub fn decode_json_body(response: &HttpResponse) -> Result<Value, ResponseError> {
    if response.status != Some(200) {
        return Err(ResponseError::HttpStatus {
            status: response.status,
        });
    }
    // The legacy server contract treats "0" as an empty body as well.
    if response.body.is_empty() || response.body == "0" {
        return Err(ResponseError::EmptyBody);
    }

    let value: Value = serde_json::from_str(&response.body)?;
    if is_falsy(&value) {
        return Err(ResponseError::Falsy);
    }
    Ok(value)
}

// Objects always count as a result, even `{}`.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

use serde_json::Value;

/// Value of both `input_type` and `response_type` for every request.
pub const JSON_FORMAT: &str = "JSON";

/// HTTP verb used for a request. The CRM API itself only needs `Post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Delete,
}

/// A request to the CRM endpoint described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Form fields; sent as the body, or as the query string for `Get`.
    pub params: Vec<(String, String)>,
}

/// Form fields shared by every REST call: the method name, the JSON
/// input/response markers and the JSON-encoded `rest_data`.
pub fn encode_rest_form(method: &str, rest_data: &Value) -> Vec<(String, String)> {
    vec![
        ("method".to_owned(), method.to_owned()),
        ("input_type".to_owned(), JSON_FORMAT.to_owned()),
        ("response_type".to_owned(), JSON_FORMAT.to_owned()),
        ("rest_data".to_owned(), rest_data.to_string()),
    ]
}

use serde_json::{Map, Value};

use super::request::encode_rest_form;
use crate::domain::SessionId;

const MODULE_FIELD: &str = "module_name";

/// Encode a module call. `module_name` and `session` are written into the
/// caller's parameters, replacing any values already there.
pub fn encode_call_form(
    module: &str,
    method: &str,
    session: &SessionId,
    mut params: Map<String, Value>,
) -> Vec<(String, String)> {
    params.insert(MODULE_FIELD.to_owned(), Value::from(module));
    params.insert(SessionId::FIELD.to_owned(), Value::from(session.as_str()));
    encode_rest_form(method, &Value::Object(params))
}

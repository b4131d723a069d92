use serde::Deserialize;
use serde_json::{Value, json};

use super::request::encode_rest_form;
use crate::domain::{ModuleCatalog, ModuleInfo, Password, SessionId, UserInfo, Username};

const LOGIN_METHOD: &str = "login";
const FIELDS_KEY: &str = "name_value_list";
const MODULES_KEY: &str = "available_modules";

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error(
        "Login failure: {} - {}.",
        .name.as_deref().unwrap_or_default(),
        .description.as_deref().unwrap_or_default()
    )]
    Rejected {
        name: Option<String>,
        description: Option<String>,
    },

    #[error("Module information missing")]
    MissingModules,
}

#[derive(Debug, Clone, Deserialize)]
struct ModuleJsonEntry {
    module_key: Value,
    module_label: Value,
}

/// Everything a successful login yields.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session_id: SessionId,
    pub modules: ModuleCatalog,
    pub user_info: UserInfo,
    /// The decoded response, with the module list taken out.
    pub result: Value,
}

pub fn encode_login_form(username: &Username, password: &Password) -> Vec<(String, String)> {
    let rest_data = json!({
        "user_auth": {
            (Username::FIELD): username.as_str(),
            (Password::FIELD): password.legacy_digest(),
        }
    });
    encode_rest_form(LOGIN_METHOD, &rest_data)
}

pub fn decode_login_result(mut result: Value) -> Result<LoginOutcome, LoginError> {
    let Some(session_id) = result
        .get("id")
        .and_then(scalar_text)
        .and_then(|id| SessionId::new(id).ok())
    else {
        return Err(LoginError::Rejected {
            name: result.get("name").and_then(scalar_text),
            description: result.get("description").and_then(scalar_text),
        });
    };

    let fields = result
        .get_mut(FIELDS_KEY)
        .and_then(Value::as_object_mut)
        .ok_or(LoginError::MissingModules)?;
    let available = fields
        .shift_remove(MODULES_KEY)
        .ok_or(LoginError::MissingModules)?;
    let user_info = fields.clone();

    Ok(LoginOutcome {
        session_id,
        modules: decode_module_catalog(&available),
        user_info,
        result,
    })
}

// Entries missing either field are skipped. Scalars are stringified and
// `null` becomes an empty string; arrays or objects cannot name a module.
fn decode_module_catalog(available: &Value) -> ModuleCatalog {
    let entries: Vec<&Value> = match available {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| ModuleJsonEntry::deserialize(entry).ok())
        .filter_map(|entry| {
            Some(ModuleInfo {
                name: module_text(&entry.module_key)?,
                label: module_text(&entry.module_label)?,
            })
        })
        .collect()
}

fn module_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_result(modules: Value) -> Value {
        json!({
            "id": "sess-1",
            "module_name": "Users",
            "name_value_list": {
                "user_id": "u1",
                "user_name": "demo",
                "available_modules": modules,
                "user_language": "en_us"
            }
        })
    }

    #[test]
    fn encode_login_form_hashes_password() {
        let params = encode_login_form(&Username::new("demo"), &Password::new("demo"));
        assert_eq!(params[0], ("method".to_owned(), "login".to_owned()));
        let rest_data: Value = serde_json::from_str(&params[3].1).unwrap();
        assert_eq!(
            rest_data,
            json!({"user_auth": {"user_name": "demo", "password": "fe01ce2a7fbac8fafaed7c982a04e229"}})
        );
    }

    #[test]
    fn decode_login_result_builds_catalog_and_user_info() {
        let outcome = decode_login_result(login_result(json!([
            {"module_key": "Accounts", "module_label": "Companies", "acls": []},
            {"module_key": "Contacts"},
            {"module_label": "Orphan"},
            "junk",
            {"module_key": "Cases", "module_label": "Cases"}
        ])))
        .unwrap();

        assert_eq!(outcome.session_id.as_str(), "sess-1");
        let names = outcome
            .modules
            .iter()
            .map(|it| (it.name.as_str(), it.label.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, [("Accounts", "Companies"), ("Cases", "Cases")]);

        let keys = outcome.user_info.keys().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(keys, ["user_id", "user_name", "user_language"]);
        assert!(outcome.result[FIELDS_KEY].get(MODULES_KEY).is_none());
        assert_eq!(outcome.result["module_name"], "Users");
    }

    #[test]
    fn decode_login_result_keeps_non_string_module_fields() {
        let outcome = decode_login_result(login_result(json!([
            {"module_key": 7, "module_label": "Numeric"},
            {"module_key": "Notes", "module_label": null},
            {"module_key": ["Bad"], "module_label": "Array"}
        ])))
        .unwrap();

        let names = outcome
            .modules
            .iter()
            .map(|it| (it.name.as_str(), it.label.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, [("7", "Numeric"), ("Notes", "")]);
        assert!(outcome.modules.contains("7"));
    }

    #[test]
    fn decode_login_result_accepts_keyed_module_list() {
        let outcome = decode_login_result(login_result(json!({
            "0": {"module_key": "Accounts", "module_label": "Accounts"},
            "1": {"module_key": "Calls", "module_label": "Calls"}
        })))
        .unwrap();
        assert_eq!(outcome.modules.len(), 2);
        assert!(outcome.modules.contains("Calls"));
    }

    #[test]
    fn decode_login_result_accepts_numeric_id() {
        let mut result = login_result(json!([]));
        result["id"] = json!(42);
        let outcome = decode_login_result(result).unwrap();
        assert_eq!(outcome.session_id.as_str(), "42");
        assert!(outcome.modules.is_empty());
    }

    #[test]
    fn decode_login_result_rejects_missing_id() {
        let err = decode_login_result(json!({
            "name": "Invalid Login",
            "number": 10,
            "description": "Login attempt failed please check the username and password"
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Login failure: Invalid Login - Login attempt failed please check the username and password."
        );

        let err = decode_login_result(json!({"id": null})).unwrap_err();
        assert_eq!(err.to_string(), "Login failure:  - .");

        let err = decode_login_result(json!({"id": ""})).unwrap_err();
        assert!(matches!(err, LoginError::Rejected { .. }));

        let err = decode_login_result(json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            LoginError::Rejected {
                name: None,
                description: None
            }
        ));
    }

    #[test]
    fn decode_login_result_requires_module_list() {
        let err = decode_login_result(json!({
            "id": "sess-1",
            "name_value_list": {"user_id": "u1"}
        }))
        .unwrap_err();
        assert!(matches!(err, LoginError::MissingModules));

        let err = decode_login_result(json!({"id": "sess-1"})).unwrap_err();
        assert!(matches!(err, LoginError::MissingModules));
    }
}

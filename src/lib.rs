//! Blocking Rust client for the 1CRM / SugarCRM legacy REST+JSON API
//! (`/service/v4/rest.php`).
//!
//! The crate is split the same way the API is: a domain layer of strong types,
//! a transport layer for the wire format (form fields carrying JSON, raw HTTP
//! responses), and a small client layer that owns the session.
//!
//! ```rust,no_run
//! use onecrm::CrmClient;
//! use serde_json::json;
//!
//! fn main() -> Result<(), onecrm::CrmError> {
//!     let mut client = CrmClient::new("https://crm.example.com/service/v4/rest.php", false)?;
//!     client.login("demo", "demo")?;
//!     print!("{}", client.list_modules()?);
//!
//!     let serde_json::Value::Object(params) = json!({
//!         "select_fields": ["id", "name"],
//!         "max_results": 10,
//!     }) else {
//!         unreachable!()
//!     };
//!     let response = client.call("Accounts", "get_entry_list", params)?;
//!     for field in onecrm::decode_entry_list(&response)? {
//!         println!("{}: {}", field.name, field.value);
//!     }
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
mod transport;

pub use client::{CrmClient, CrmClientBuilder, CrmError, ErrorKind, decode_entry_list};
pub use domain::{
    Endpoint, EntryField, ModuleCatalog, ModuleInfo, Password, SessionId, UserInfo, Username,
    ValidationError,
};
pub use transport::{HttpResponse, parse_raw_response};

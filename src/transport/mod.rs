//! Transport layer: HTTP and wire-format details (serialization/deserialization).

mod call;
mod entry_list;
mod login;
mod request;
mod response;

pub use call::encode_call_form;
pub use entry_list::{EntryListError, decode_entry_list};
pub use login::{LoginError, decode_login_result, encode_login_form};
pub use request::{HttpMethod, HttpRequest};
pub use response::{HttpResponse, ResponseError, decode_json_body, parse_raw_response};

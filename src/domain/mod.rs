//! Domain layer: strong types with validation and invariants (no I/O).

mod response;
mod validation;
mod value;

pub use response::{EntryField, ModuleCatalog, ModuleInfo, UserInfo};
pub use validation::ValidationError;
pub use value::{Endpoint, Password, SessionId, Username};

pub mod error;
pub mod extract;
pub mod module;
pub mod types;

pub use error::ServiceError;
pub use extract::ApiJson;
pub use module::Module;
pub use types::{is_digits, new_id, normalize_email, now_rfc3339, now_unix};

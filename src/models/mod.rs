pub use account::*;
pub use api_response::*;
pub use transaction::*;
pub use user::*;

pub mod account;
pub mod api_response;
pub mod serde_utils;
pub mod transaction;
pub mod user;

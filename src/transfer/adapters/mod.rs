//! Adapters module - transfer service implementations

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpTransferService;
pub use mock::MockTransferService;
pub use traits::TransferService;

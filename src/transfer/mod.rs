//! Transfer module - main module file
//!
//! This module provides the confirmation step of the transfer wizard: one
//! submission, a short cancellation window, and the receipt data.

pub mod adapters;
pub mod controller;
pub mod errors;
pub mod receipt;
pub mod state;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use adapters::{HttpTransferService, MockTransferService, TransferService};
pub use controller::{CancelOutcome, ControllerConfig, TransferConfirmation};
pub use errors::{CancellationError, SubmissionError};
pub use receipt::Receipt;
pub use state::{ConfirmationState, Phase};
pub use types::{TransactionId, TransferRequest, TransferResult};
pub use window::CancellationWindow;

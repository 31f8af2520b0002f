//! Payment intent domain.
//!
//! The intent aggregate, its status machine and the error vocabulary of
//! the purchase and confirmation flows.

mod errors;
mod intent;
mod provider;
mod status;

pub use errors::CheckoutError;
pub use intent::{PaymentIntent, DEFAULT_CURRENCY};
pub use provider::{amount_matches, to_minor_units, Provider, MAX_PURCHASE_AMOUNT};
pub use status::{PaymentStatus, TransitionOutcome};

//! Razorpay payment gateway adapter.

mod api_types;
mod mock_gateway;
mod razorpay_adapter;

pub use mock_gateway::MockGateway;
pub use razorpay_adapter::{RazorpayConfig, RazorpayGateway};

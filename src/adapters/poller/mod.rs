//! Client reconciliation poller and its status sources.

mod http_status_source;
mod in_process_status_source;
mod reconciliation_poller;

pub use http_status_source::HttpStatusSource;
pub use in_process_status_source::InProcessStatusSource;
pub use reconciliation_poller::{PollOutcome, PollerConfig, ReconciliationPoller};

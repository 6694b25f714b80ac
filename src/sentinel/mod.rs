mod orchestrator;
mod report;
mod retry;
mod store;

pub use orchestrator::{ScanError, Sentinel, SentinelConfig};
pub use report::ScanReport;
pub use retry::RetryPolicy;
pub use store::{LeadStore, NotificationSink, ScanWrite, StoreError};

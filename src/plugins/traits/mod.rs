pub mod notifier;
pub mod retailer;

pub use notifier::AlertSink;
pub use retailer::{require_identifier, RetailerAdapter};

pub mod manager;
pub mod notifiers;
pub mod retailers;
pub mod traits;

pub use manager::{AdapterContext, AdapterRegistry};
pub use notifiers::build_alert_sink;
pub use traits::{AlertSink, RetailerAdapter};

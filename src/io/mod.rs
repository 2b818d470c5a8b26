//! IO modules - external system interfaces
//!
//! - `session` - authenticated HTTP session against the report site
//! - `reports` - report enumeration from the child's index page
//! - `mqtt_egress` - MQTT publisher for sensor entity snapshots

pub mod mqtt_egress;
pub mod reports;
pub mod session;

// Re-export commonly used types
pub use mqtt_egress::{EgressMessage, EntityPublisher};
pub use reports::list_reports;
pub use session::{PageSource, Session};

//! Validators over extracted shapes. Every validator is total: it always
//! returns a result record, never an error.

pub mod collector;
pub mod complexity;
pub mod compliance;
pub mod consistency;
pub mod correction;
pub mod geometry;
pub mod preview;

pub use complexity::analyze_complexity;
pub use compliance::validate_compliance;
pub use consistency::validate_against_set;
pub use correction::synthesize;
pub use geometry::validate_geometry;
pub use preview::{preview_report, validate_at_sizes};

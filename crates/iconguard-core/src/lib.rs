//! IconGuard core library: design-system compliance engine for vector icons.
//!
//! Candidate documents are decomposed into geometric primitives, validated
//! against a rule profile, scored for complexity and small-size legibility,
//! compared with a sibling icon set and, when validation fails, turned into a
//! prioritized correction directive for a regeneration pass.
//!
//! All validators are pure functions over immutable input. The only shared
//! state is the process-wide rule profile, loaded once on first use.

pub mod errors;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod profile;
pub mod validate;
pub mod workflow;

pub use errors::{IconGuardError, IconGuardResult};
pub use extract::document::parse_viewbox;
pub use extract::extract;
pub use pipeline::{evaluate, evaluate_variants, EvaluationRequest, IconReport, ReportCache};
pub use profile::{active_profile, ComplianceProfile, RuleProfile};
pub use validate::{
    analyze_complexity, preview_report, synthesize, validate_against_set, validate_at_sizes,
    validate_compliance, validate_geometry,
};
pub use workflow::{GenerationSession, RetryPolicy, SessionState, SessionStep};

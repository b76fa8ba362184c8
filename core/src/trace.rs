//! Resolution trace for debugging rule sets.
//!
//! [`RuleSet::resolve_with_trace`](crate::RuleSet::resolve_with_trace)
//! returns the same outcome as `resolve` plus the path taken to it: every
//! rule tried, in order, and whether its pattern matched. Useful when a
//! rule set grows large enough that "why did this path redirect there"
//! stops being obvious.

use crate::resolve::ResolveError;
use crate::ruleset::Outcome;

/// Trace of one resolution.
///
/// # INV: `outcome` == `resolve()` outcome
///
/// The `outcome` field always equals what
/// [`RuleSet::resolve`](crate::RuleSet::resolve) would return for the same
/// request. Steps stop at the first match (first-match-wins is preserved
/// in the trace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveTrace {
    /// Each rule tried, in declaration order.
    pub steps: Vec<RuleStep>,
    /// The final outcome, identical to `resolve()`.
    pub outcome: Result<Outcome, ResolveError>,
}

/// One rule's part in a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleStep {
    /// Position in the rule set (0-based declaration order).
    pub index: usize,
    /// The rule's name, if declared.
    pub name: Option<String>,
    /// The pattern as declared.
    pub pattern: String,
    /// Did the pattern match the request path?
    pub matched: bool,
}

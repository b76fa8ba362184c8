//! Ordered rule collection with first-match-wins resolution.
//!
//! A [`RuleSet`] is built once at startup by a [`RuleSetBuilder`] — the
//! host composes it and hands it to the redirect handler — and is read-only
//! afterwards, so request threads resolve against it without locking.

use crate::lookup::ReverseLookup;
use crate::resolve::resolve_destination;
use crate::response::{RedirectAction, RedirectStatus};
use crate::rule::{CompiledRule, RuleKind, RuleSpec};
use crate::trace::{ResolveTrace, RuleStep};
use crate::{RedirectError, Request, ResolveError};
use std::sync::Arc;

/// Outcome of resolving one request against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No rule matched; pass the request through.
    NoMatch,
    /// An exclusion rule matched; pass through and stop searching.
    Excluded,
    /// A redirect rule matched and its destination was computed.
    Redirect(RedirectAction),
}

/// An ordered, immutable collection of compiled redirect rules.
///
/// # INV: first-match-wins
///
/// Rules are tried strictly in declaration order. The first rule whose
/// pattern matches decides the outcome — redirect and exclusion alike. A
/// later rule never overrides an earlier match.
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    lookup: Option<Arc<dyn ReverseLookup>>,
}

impl RuleSet {
    /// Create a builder for `RuleSet`.
    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Resolve a request.
    ///
    /// Resolution is a pure function of the rule set and the request:
    /// resolving the same request twice yields identical outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a matched rule's destination cannot be
    /// computed (an unresolvable reverse-lookup name). This is a 5xx-class
    /// failure, not a "no match".
    pub fn resolve(&self, req: &Request) -> Result<Outcome, ResolveError> {
        let path = mount_path(req.path());
        for rule in &self.rules {
            if let Some(path_match) = rule.pattern.matches(path) {
                return self.decide(rule, &path_match, req);
            }
        }
        Ok(Outcome::NoMatch)
    }

    /// Resolve a request, recording which rules were tried.
    ///
    /// # INV: trace outcome == [`resolve`](Self::resolve) outcome
    ///
    /// The trace stops at the first match, preserving first-match-wins.
    pub fn resolve_with_trace(&self, req: &Request) -> ResolveTrace {
        let path = mount_path(req.path());
        let mut steps = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let path_match = rule.pattern.matches(path);
            steps.push(RuleStep {
                index,
                name: rule.name().map(str::to_string),
                pattern: rule.pattern().to_string(),
                matched: path_match.is_some(),
            });
            if let Some(path_match) = path_match {
                return ResolveTrace {
                    steps,
                    outcome: self.decide(rule, &path_match, req),
                };
            }
        }
        ResolveTrace {
            steps,
            outcome: Ok(Outcome::NoMatch),
        }
    }

    fn decide(
        &self,
        rule: &CompiledRule,
        path_match: &crate::pattern::PathMatch,
        req: &Request,
    ) -> Result<Outcome, ResolveError> {
        match &rule.kind {
            RuleKind::Exclude => Ok(Outcome::Excluded),
            RuleKind::Redirect(policy) => {
                let location =
                    resolve_destination(policy, path_match, req, self.lookup.as_deref())?;
                let status = if policy.permanent {
                    RedirectStatus::Permanent
                } else {
                    RedirectStatus::Temporary
                };
                let mut action = RedirectAction::new(location, status);
                if let Some(hours) = policy.cache_hours {
                    action = action.cache_hours(hours);
                }
                for header in &policy.vary {
                    action = action.vary(header.as_str());
                }
                Ok(Outcome::Redirect(action))
            }
        }
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the compiled rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .field("has_lookup", &self.lookup.is_some())
            .finish()
    }
}

/// Patterns are declared relative to the mount point, so exactly one
/// leading slash comes off before matching.
fn mount_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// Builder for [`RuleSet`] — the append-only registration surface.
///
/// The host composes the full rule sequence here during initialization, in
/// a deterministic order, then compiles it once with
/// [`build`](Self::build).
///
/// # Example
///
/// ```
/// use detour::{RuleSet, RuleSpec};
///
/// let rules = RuleSet::builder()
///     .rule(RuleSpec::exclude(r"^iam/the/walrus/$"))
///     .rule(RuleSpec::redirect(r"^iam/the/.*/$", "/coo/coo/cachoo/"))
///     .build()
///     .unwrap();
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Default)]
#[must_use]
pub struct RuleSetBuilder {
    specs: Vec<RuleSpec>,
    lookup: Option<Arc<dyn ReverseLookup>>,
}

impl RuleSetBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rule declaration.
    pub fn rule(mut self, spec: RuleSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Append a sequence of rule declarations, preserving their order.
    pub fn rules(mut self, specs: impl IntoIterator<Item = RuleSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Install the reverse-lookup capability for named destinations.
    pub fn reverse_lookup(mut self, lookup: impl ReverseLookup + 'static) -> Self {
        self.lookup = Some(Arc::new(lookup));
        self
    }

    /// Compile every rule and produce the immutable [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Fails fast on the first malformed rule ([`RedirectError`]); no rule
    /// set is produced from a partially valid declaration list.
    pub fn build(self) -> Result<RuleSet, RedirectError> {
        let rules = self
            .specs
            .into_iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleSet {
            rules,
            lookup: self.lookup,
        })
    }
}

impl std::fmt::Debug for RuleSetBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSetBuilder")
            .field("specs", &self.specs.len())
            .field("has_lookup", &self.lookup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(outcome: &Outcome) -> &str {
        match outcome {
            Outcome::Redirect(action) => &action.location,
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn first_match_wins() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^the/dude$", "/first/"))
            .rule(RuleSpec::redirect(r"^the/dude$", "/second/"))
            .build()
            .unwrap();
        let outcome = rules.resolve(&Request::get("/the/dude")).unwrap();
        assert_eq!(location(&outcome), "/first/");
    }

    #[test]
    fn exclusion_short_circuits() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::exclude(r"^iam/the/walrus/$"))
            .rule(RuleSpec::redirect(r"^iam/the/.*/$", "/coo/coo/cachoo/"))
            .build()
            .unwrap();

        assert_eq!(
            rules.resolve(&Request::get("/iam/the/walrus/")).unwrap(),
            Outcome::Excluded
        );
        // Exclusions honour locale matching too.
        assert_eq!(
            rules.resolve(&Request::get("/pt-BR/iam/the/walrus/")).unwrap(),
            Outcome::Excluded
        );
        let outcome = rules.resolve(&Request::get("/iam/the/marmot/")).unwrap();
        assert_eq!(location(&outcome), "/coo/coo/cachoo/");
    }

    #[test]
    fn earlier_redirect_beats_later_exclusion() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^iam/the/walrus/$", "/coo/coo/cachoo/"))
            .rule(RuleSpec::exclude(r"^iam/the/walrus/$"))
            .build()
            .unwrap();
        let outcome = rules.resolve(&Request::get("/iam/the/walrus/")).unwrap();
        assert_eq!(location(&outcome), "/coo/coo/cachoo/");
    }

    #[test]
    fn no_match_passes_through() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^the/dude$", "/abide/"))
            .build()
            .unwrap();
        assert_eq!(
            rules.resolve(&Request::get("/the/jesus")).unwrap(),
            Outcome::NoMatch
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^iam/the/(?P<name>.+)/$", "/donnie/the/{name}/"))
            .build()
            .unwrap();
        let req = Request::get("/pt-BR/iam/the/walrus/");
        let first = rules.resolve(&req).unwrap();
        let second = rules.resolve(&req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn status_and_headers_carried_onto_action() {
        let rules = RuleSet::builder()
            .rule(
                RuleSpec::redirect(r"^the/dude$", "/abide/")
                    .permanent(false)
                    .cache_hours(2)
                    .vary("Accept-Language"),
            )
            .build()
            .unwrap();
        let outcome = rules.resolve(&Request::get("/the/dude")).unwrap();
        let Outcome::Redirect(action) = outcome else {
            panic!("expected redirect");
        };
        assert_eq!(action.status, RedirectStatus::Temporary);
        assert_eq!(action.cache_control().as_deref(), Some("max-age=7200"));
        assert_eq!(action.vary_header().as_deref(), Some("Accept-Language"));
    }

    #[test]
    fn build_fails_fast_on_malformed_rule() {
        let err = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^fine$", "/ok/"))
            .rule(RuleSpec::redirect(r"^(unclosed$", "/bad/"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RedirectError::InvalidPattern { .. }));
    }

    #[test]
    fn trace_matches_resolve() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^a$", "/a/").name("first"))
            .rule(RuleSpec::redirect(r"^b$", "/b/").name("second"))
            .build()
            .unwrap();

        let req = Request::get("/b");
        let trace = rules.resolve_with_trace(&req);
        assert_eq!(trace.outcome, rules.resolve(&req));
        assert_eq!(trace.steps.len(), 2);
        assert!(!trace.steps[0].matched);
        assert!(trace.steps[1].matched);
        assert_eq!(trace.steps[1].name.as_deref(), Some("second"));
    }

    #[test]
    fn trace_records_all_steps_on_no_match() {
        let rules = RuleSet::builder()
            .rule(RuleSpec::redirect(r"^a$", "/a/"))
            .rule(RuleSpec::redirect(r"^b$", "/b/"))
            .build()
            .unwrap();
        let trace = rules.resolve_with_trace(&Request::get("/c"));
        assert_eq!(trace.outcome, Ok(Outcome::NoMatch));
        assert_eq!(trace.steps.len(), 2);
    }

    #[test]
    fn rule_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleSet>();
    }
}

//! detour — declarative URL-redirection rules engine.
//!
//! An ordered list of pattern → destination rules, compiled once at startup
//! into a first-match-wins resolver. Incoming request paths resolve to a
//! redirect action (301/302 with a computed `Location`), an exclusion
//! ("never redirect this path"), or a pass-through.
//!
//! # Architecture
//!
//! - [`RuleSpec`] — one rule as declared: pattern, destination, options.
//! - [`RuleSet`] / [`RuleSetBuilder`] — ordered compilation and
//!   first-match-wins resolution; the builder is the registration surface
//!   the host fills during initialization.
//! - [`Request`] — framework-neutral request context (decoded path, raw
//!   query string, headers).
//! - [`Outcome`] / [`RedirectAction`] — what resolution produces; an
//!   adapter (e.g. `detour-http`) turns the action into a real response.
//! - [`Selector`] — request-time destination choice (header, User-Agent,
//!   platform); the callable destination case.
//! - [`ReverseLookup`] — host-provided name → path resolution for
//!   destinations that are route names rather than URLs.
//!
//! Destination URLs are assembled in a fixed order — substitution (with
//! capture sanitization), locale prefix, query handling, anchor — with a
//! protocol-relative guard as the final step, so a crafted path can never
//! turn a redirect into `//attacker.example`.
//!
//! # Example
//!
//! ```
//! use detour::{Outcome, Request, RuleSet, RuleSpec};
//!
//! let rules = RuleSet::builder()
//!     .rule(RuleSpec::exclude(r"^iam/the/walrus/$"))
//!     .rule(RuleSpec::redirect(r"^iam/the/(?P<name>.+)/$", "/donnie/the/{name}/"))
//!     .build()
//!     .unwrap();
//!
//! let outcome = rules.resolve(&Request::get("/pt-BR/iam/the/marmot/")).unwrap();
//! match outcome {
//!     Outcome::Redirect(action) => {
//!         assert_eq!(action.location, "/pt-BR/donnie/the/marmot/");
//!         assert_eq!(action.status.code(), 301);
//!     }
//!     other => panic!("expected redirect, got {other:?}"),
//! }
//! ```
//!
//! # Concurrency
//!
//! A built [`RuleSet`] is immutable and `Send + Sync`: share it behind an
//! `Arc` and resolve from any number of threads without locking. Resolution
//! is pure and synchronous; only selector and reverse-lookup calls run
//! host code.

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod escape;
mod lookup;
mod pattern;
mod request;
mod resolve;
mod response;
mod rule;
mod ruleset;
mod selector;
mod trace;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use pattern::{PathCaptures, PathMatch, RulePattern};
pub use request::{decode_path, split_target, Request, RequestBuilder};
pub use response::{RedirectAction, RedirectStatus};
pub use rule::{CompiledRule, Destination, RuleSpec};
pub use ruleset::{Outcome, RuleSet, RuleSetBuilder};

// Seams
pub use lookup::{LookupError, ReverseLookup, TableLookup};
pub use selector::{
    FirefoxSelector, FnSelector, HeaderSelector, PlatformSelector, Selector, UserAgentSelector,
};

// Errors
pub use resolve::ResolveError;

// Trace types
pub use trace::{ResolveTrace, RuleStep};

// Config (feature-gated)
#[cfg(feature = "config")]
pub use config::{OneOrMany, QueryValue, RuleConfig, RuleSetConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use detour::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Destination,
        FirefoxSelector,
        FnSelector,
        HeaderSelector,
        LookupError,
        Outcome,
        PathCaptures,
        PlatformSelector,
        RedirectAction,
        RedirectError,
        RedirectStatus,
        Request,
        ResolveError,
        ReverseLookup,
        RuleSet,
        RuleSetBuilder,
        RuleSpec,
        Selector,
        TableLookup,
        UserAgentSelector,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule compilation and configuration.
///
/// These are caught when the rule set is built, not at request time. Fix
/// the declaration and rebuild — a malformed rule is never silently
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectError {
    /// A path pattern failed to compile.
    InvalidPattern {
        /// The pattern as declared.
        pattern: String,
        /// The underlying error message.
        source: String,
    },
    /// An unknown regex flag character.
    InvalidFlags {
        /// The offending flag character(s).
        flags: String,
    },
    /// A config declaration is structurally invalid.
    InvalidConfig {
        /// What was wrong with it.
        source: String,
    },
}

impl std::fmt::Display for RedirectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, source } => {
                write!(f, "invalid pattern \"{pattern}\": {source}")
            }
            Self::InvalidFlags { flags } => {
                write!(
                    f,
                    "unknown regex flag \"{flags}\" — supported flags: i, m, s, x"
                )
            }
            Self::InvalidConfig { source } => {
                write!(f, "invalid rule config: {source}")
            }
        }
    }
}

impl std::error::Error for RedirectError {}

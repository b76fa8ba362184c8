//! Reverse-lookup seam: named destinations resolved by the host.
//!
//! A destination that is neither a template nor an obvious URL is treated
//! as a name registered with the host's URL namer (a route name, a view
//! name, …). The engine only sees this capability as a trait object; hosts
//! plug in whatever their router provides. [`TableLookup`] is a plain
//! map-backed implementation for hosts without a namer and for tests.

use std::collections::HashMap;
use std::fmt;

/// Resolves a destination name to a path.
///
/// `args` and `kwargs` come either from the rule's explicit configuration
/// or from the match's captures (positional and named respectively).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the rule set is shared across
/// request-handling threads without locking.
pub trait ReverseLookup: Send + Sync {
    /// Resolve `name` to a path string.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if the name is not registered. This
    /// propagates to the caller as a request-time failure, distinct from
    /// "no rule matched".
    fn resolve_name(
        &self,
        name: &str,
        args: &[String],
        kwargs: &[(String, String)],
    ) -> Result<String, LookupError>;
}

impl ReverseLookup for Box<dyn ReverseLookup> {
    fn resolve_name(
        &self,
        name: &str,
        args: &[String],
        kwargs: &[(String, String)],
    ) -> Result<String, LookupError> {
        (**self).resolve_name(name, args, kwargs)
    }
}

/// A destination name with no registered target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    /// The name that failed to resolve.
    pub name: String,
}

impl LookupError {
    /// Create a lookup error for the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no reverse target registered for \"{}\"", self.name)
    }
}

impl std::error::Error for LookupError {}

/// Map-backed [`ReverseLookup`]: name → fixed path. Ignores args/kwargs.
#[derive(Debug, Clone, Default)]
pub struct TableLookup {
    targets: HashMap<String, String>,
}

impl TableLookup {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name → path entry.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.targets.insert(name.into(), path.into());
        self
    }
}

impl ReverseLookup for TableLookup {
    fn resolve_name(
        &self,
        name: &str,
        _args: &[String],
        _kwargs: &[(String, String)],
    ) -> Result<String, LookupError> {
        self.targets
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_resolves_registered_names() {
        let table = TableLookup::new().register("opinion", "/just/your/opinion/man");
        assert_eq!(
            table.resolve_name("opinion", &[], &[]).unwrap(),
            "/just/your/opinion/man"
        );
    }

    #[test]
    fn table_errors_on_unknown_name() {
        let table = TableLookup::new();
        let err = table.resolve_name("missing", &[], &[]).unwrap_err();
        assert_eq!(err.name, "missing");
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn lookup_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TableLookup>();
        assert_send_sync::<Box<dyn ReverseLookup>>();
    }
}

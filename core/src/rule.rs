//! Rule declarations and their compiled form.
//!
//! A [`RuleSpec`] is what the host declares: a pattern, a destination, and
//! options. [`RuleSpec::compile`] turns it into a [`CompiledRule`] with the
//! pattern built and the destination classified. The Spec/compiled split
//! keeps the declaration cheap to construct and the per-request path free
//! of string sniffing: every classification decision happens once, at
//! build time.

use crate::pattern::RulePattern;
use crate::selector::Selector;
use crate::RedirectError;
use std::fmt;
use std::sync::Arc;

/// A rule's destination, as declared.
#[derive(Clone)]
pub enum Destination {
    /// A URL, path template, or lookup name — classified at compile time.
    Url(String),
    /// A request-time selector (the callable destination case).
    Selector(Arc<dyn Selector>),
}

impl Destination {
    /// Wrap a [`Selector`] implementation.
    pub fn selector(selector: impl Selector + 'static) -> Self {
        Self::Selector(Arc::new(selector))
    }

    /// Wrap a plain closure as a selector destination.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&crate::Request) -> String + Send + Sync + 'static,
    {
        Self::Selector(Arc::new(crate::selector::FnSelector(f)))
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Selector(_) => f.debug_tuple("Selector").finish(),
        }
    }
}

impl From<&str> for Destination {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for Destination {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

/// An uncompiled rule declaration.
///
/// Build with [`RuleSpec::redirect`] or [`RuleSpec::exclude`], adjust with
/// the builder methods, and hand to a
/// [`RuleSetBuilder`](crate::RuleSetBuilder). Defaults: permanent redirect,
/// original query preserved, locale matched and prepended.
///
/// # Example
///
/// ```
/// use detour::RuleSpec;
///
/// let rule = RuleSpec::redirect(r"^the/dude$", "abides")
///     .permanent(false)
///     .anchor("toe");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleSpec {
    pattern: String,
    destination: Option<Destination>,
    permanent: bool,
    query: Option<Vec<(String, String)>>,
    merge_query: bool,
    anchor: Option<String>,
    cache_hours: Option<u32>,
    vary: Vec<String>,
    prepend_locale: bool,
    locale_prefix: bool,
    re_flags: Option<String>,
    name: Option<String>,
    lookup_args: Vec<String>,
    lookup_kwargs: Vec<(String, String)>,
}

impl RuleSpec {
    fn new(pattern: impl Into<String>, destination: Option<Destination>) -> Self {
        Self {
            pattern: pattern.into(),
            destination,
            permanent: true,
            query: None,
            merge_query: false,
            anchor: None,
            cache_hours: None,
            vary: Vec::new(),
            prepend_locale: true,
            locale_prefix: true,
            re_flags: None,
            name: None,
            lookup_args: Vec::new(),
            lookup_kwargs: Vec::new(),
        }
    }

    /// A redirect rule: requests matching `pattern` go to `to`.
    pub fn redirect(pattern: impl Into<String>, to: impl Into<Destination>) -> Self {
        Self::new(pattern, Some(to.into()))
    }

    /// An exclusion rule: requests matching `pattern` are never redirected,
    /// and no later rule is considered for them.
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self::new(pattern, None)
    }

    /// Permanent (301, the default) or temporary (302).
    pub fn permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    /// Replace the original query string with these parameters
    /// (or merge, with [`merge_query`](Self::merge_query)).
    pub fn query(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query = Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    /// Drop the original query string entirely.
    pub fn strip_query(mut self) -> Self {
        self.query = Some(Vec::new());
        self
    }

    /// Merge [`query`](Self::query) with the original parameters instead of
    /// replacing them. Original parameters survive; repeated keys append.
    pub fn merge_query(mut self, merge: bool) -> Self {
        self.merge_query = merge;
        self
    }

    /// Append `#<anchor>` after any query string.
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Emit `Cache-Control: max-age=…` for this many hours.
    pub fn cache_hours(mut self, hours: u32) -> Self {
        self.cache_hours = Some(hours);
        self
    }

    /// Echo a header name into the `Vary` response header. May be called
    /// more than once.
    pub fn vary(mut self, header: impl Into<String>) -> Self {
        self.vary.push(header.into());
        self
    }

    /// Prepend the request's locale prefix to the computed destination
    /// (default `true`).
    pub fn prepend_locale(mut self, prepend: bool) -> Self {
        self.prepend_locale = prepend;
        self
    }

    /// Match the pattern with an optional leading locale segment
    /// (default `true`).
    pub fn locale_prefix(mut self, locale_prefix: bool) -> Self {
        self.locale_prefix = locale_prefix;
        self
    }

    /// Regex flags applied at compile time (`i`, `m`, `s`, `x`).
    pub fn re_flags(mut self, flags: impl Into<String>) -> Self {
        self.re_flags = Some(flags.into());
        self
    }

    /// Name this rule for introspection and traces. Not used in matching.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Positional args passed to the reverse lookup instead of the
    /// captures.
    pub fn lookup_args(mut self, args: &[&str]) -> Self {
        self.lookup_args = args.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// Keyword args passed to the reverse lookup instead of the captures.
    pub fn lookup_kwargs(mut self, kwargs: &[(&str, &str)]) -> Self {
        self.lookup_kwargs = kwargs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self
    }

    /// Compile this declaration.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError`] for a malformed pattern or unknown regex
    /// flag. Compilation failures are fatal at build time — a malformed
    /// rule is never silently skipped.
    pub fn compile(self) -> Result<CompiledRule, RedirectError> {
        let pattern =
            RulePattern::compile(&self.pattern, self.re_flags.as_deref(), self.locale_prefix)?;

        let kind = match self.destination {
            None => RuleKind::Exclude,
            Some(destination) => RuleKind::Redirect(RedirectPolicy {
                target: Target::classify(destination),
                permanent: self.permanent,
                query: self.query,
                merge_query: self.merge_query,
                anchor: self.anchor,
                cache_hours: self.cache_hours,
                vary: self.vary,
                prepend_locale: self.prepend_locale,
                lookup_args: self.lookup_args,
                lookup_kwargs: self.lookup_kwargs,
            }),
        };

        Ok(CompiledRule {
            pattern,
            kind,
            name: self.name,
        })
    }
}

/// A compiled rule: matching pattern plus redirect policy or exclusion.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(crate) pattern: RulePattern,
    pub(crate) kind: RuleKind,
    name: Option<String>,
}

impl CompiledRule {
    /// The rule's name, if one was declared.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The pattern as declared.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    /// Whether this is an exclusion ("no redirect") rule.
    #[must_use]
    pub fn is_exclusion(&self) -> bool {
        matches!(self.kind, RuleKind::Exclude)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum RuleKind {
    Exclude,
    Redirect(RedirectPolicy),
}

#[derive(Debug, Clone)]
pub(crate) struct RedirectPolicy {
    pub(crate) target: Target,
    pub(crate) permanent: bool,
    pub(crate) query: Option<Vec<(String, String)>>,
    pub(crate) merge_query: bool,
    pub(crate) anchor: Option<String>,
    pub(crate) cache_hours: Option<u32>,
    pub(crate) vary: Vec<String>,
    pub(crate) prepend_locale: bool,
    pub(crate) lookup_args: Vec<String>,
    pub(crate) lookup_kwargs: Vec<(String, String)>,
}

/// A destination after compile-time classification.
#[derive(Clone)]
pub(crate) enum Target {
    /// A URL or path; `substitute` is set when it carries placeholders.
    Template { template: String, substitute: bool },
    /// A name for the reverse-lookup capability.
    LookupName(String),
    /// A request-time selector.
    Selector(Arc<dyn Selector>),
}

impl Target {
    /// Classify a declared destination.
    ///
    /// The shape heuristic, applied once here rather than per request:
    /// a string with `{…}` placeholders is a substitution template; a
    /// string that already looks like a concrete path or absolute URL
    /// (starts with `/`, or contains `://`) is used literally and never
    /// consults the reverse lookup; anything else is a lookup name.
    fn classify(destination: Destination) -> Self {
        match destination {
            Destination::Selector(selector) => Self::Selector(selector),
            Destination::Url(url) => {
                if has_placeholders(&url) {
                    Self::Template {
                        template: url,
                        substitute: true,
                    }
                } else if url.starts_with('/') || url.contains("://") {
                    Self::Template {
                        template: url,
                        substitute: false,
                    }
                } else {
                    Self::LookupName(url)
                }
            }
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template { template, substitute } => f
                .debug_struct("Template")
                .field("template", template)
                .field("substitute", substitute)
                .finish(),
            Self::LookupName(name) => f.debug_tuple("LookupName").field(name).finish(),
            Self::Selector(_) => f.debug_tuple("Selector").finish(),
        }
    }
}

/// Does the string contain `{}` / `{name}` placeholders?
///
/// `{{` and `}}` are literal braces, as in the substitution step.
fn has_placeholders(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            if chars.peek() == Some(&'{') {
                chars.next();
            } else {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_of(to: &str) -> Target {
        match RuleSpec::redirect("^x$", to).compile().unwrap().kind {
            RuleKind::Redirect(policy) => policy.target,
            RuleKind::Exclude => panic!("expected redirect"),
        }
    }

    #[test]
    fn template_with_placeholders() {
        assert!(matches!(
            target_of("/donnie/the/{name}/"),
            Target::Template { substitute: true, .. }
        ));
        assert!(matches!(
            target_of("/donnie/the/{}/"),
            Target::Template { substitute: true, .. }
        ));
    }

    #[test]
    fn rooted_path_is_literal() {
        assert!(matches!(
            target_of("/coo/coo/cachoo/"),
            Target::Template { substitute: false, .. }
        ));
    }

    #[test]
    fn absolute_url_is_literal() {
        assert!(matches!(
            target_of("https://example.com/egg-man/"),
            Target::Template { substitute: false, .. }
        ));
    }

    #[test]
    fn bare_name_is_lookup() {
        assert!(matches!(
            target_of("yeah.well.you.know.thats"),
            Target::LookupName(_)
        ));
    }

    #[test]
    fn escaped_braces_are_not_placeholders() {
        assert!(!has_placeholders("/a/{{literal}}/"));
        assert!(has_placeholders("/a/{x}/"));
        assert!(has_placeholders("/a/{}/"));
    }

    #[test]
    fn exclusion_has_no_policy() {
        let rule = RuleSpec::exclude("^iam/the/walrus/$").compile().unwrap();
        assert!(rule.is_exclusion());
    }

    #[test]
    fn name_is_carried_through() {
        let rule = RuleSpec::redirect("^the/dude$", "abides")
            .name("Lebowski")
            .compile()
            .unwrap();
        assert_eq!(rule.name(), Some("Lebowski"));
        assert_eq!(rule.pattern(), "^the/dude$");
    }

    #[test]
    fn bad_pattern_fails_compilation() {
        let err = RuleSpec::redirect("^(unclosed$", "/x/").compile().unwrap_err();
        assert!(matches!(err, RedirectError::InvalidPattern { .. }));
    }

    #[test]
    fn selector_destination_classifies_as_selector() {
        let spec = RuleSpec::redirect(
            "^the/dude$",
            Destination::from_fn(|_req| "/just/your/opinion/man".to_string()),
        );
        let rule = spec.compile().unwrap();
        match rule.kind {
            RuleKind::Redirect(policy) => {
                assert!(matches!(policy.target, Target::Selector(_)));
            }
            RuleKind::Exclude => panic!("expected redirect"),
        }
    }
}

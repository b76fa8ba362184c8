//! Destination resolution: from a matched rule to the final URL.
//!
//! The steps run in a fixed order, and the order is load-bearing:
//!
//! 1. base URL — selector call, template substitution, or reverse lookup;
//! 2. locale prefix prepended to rooted paths;
//! 3. query string replaced / merged / preserved / stripped;
//! 4. anchor fragment;
//! 5. protocol-relative guard, always last, so no earlier step can
//!    reintroduce a `//host` form.

use crate::escape::sanitize_capture;
use crate::lookup::{LookupError, ReverseLookup};
use crate::pattern::{PathCaptures, PathMatch};
use crate::rule::{RedirectPolicy, Target};
use crate::Request;
use std::fmt;
use url::form_urlencoded;

/// Request-time resolution failure.
///
/// Distinct from "no rule matched": a rule *did* match, but its destination
/// could not be computed. Callers should surface this as a 5xx-class
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The rule's destination is a reverse-lookup name with no registered
    /// target.
    Lookup(LookupError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup(e) => write!(f, "redirect destination unresolvable: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lookup(e) => Some(e),
        }
    }
}

/// Compute the final redirect URL for a matched rule.
pub(crate) fn resolve_destination(
    policy: &RedirectPolicy,
    path_match: &PathMatch,
    req: &Request,
    lookup: Option<&dyn ReverseLookup>,
) -> Result<String, ResolveError> {
    let mut url = base_url(policy, path_match, req, lookup)?;

    // Locale prefix applies to rooted paths only: splicing it into a
    // relative segment or an absolute URL would corrupt the destination.
    if policy.prepend_locale {
        if let Some(locale) = &path_match.locale {
            if url.starts_with('/') && !url.starts_with("//") {
                url.insert_str(0, &format!("/{locale}"));
            }
        }
    }

    append_query(&mut url, policy, req);

    if let Some(anchor) = &policy.anchor {
        url.push('#');
        url.push_str(anchor);
    }

    // Guard last: a Location starting `//` is protocol-relative and would
    // send the client to whatever host follows the slashes.
    if url.starts_with("//") {
        let stripped = url.trim_start_matches('/');
        url = format!("/{stripped}");
    }

    Ok(url)
}

/// Step 1: the base URL before locale/query/anchor handling.
fn base_url(
    policy: &RedirectPolicy,
    path_match: &PathMatch,
    req: &Request,
    lookup: Option<&dyn ReverseLookup>,
) -> Result<String, ResolveError> {
    match &policy.target {
        Target::Selector(selector) => Ok(selector.select(req)),
        Target::Template { template, substitute } => {
            if *substitute {
                Ok(substitute_captures(template, &path_match.captures))
            } else {
                Ok(template.clone())
            }
        }
        Target::LookupName(name) => {
            let Some(lookup) = lookup else {
                // Nothing to consult: assume the name is itself a URL.
                return Ok(name.clone());
            };
            let (args, kwargs) = lookup_params(policy, &path_match.captures);
            lookup
                .resolve_name(name, &args, &kwargs)
                .map_err(ResolveError::Lookup)
        }
    }
}

/// Explicit rule args/kwargs win; otherwise the captures stand in.
fn lookup_params(
    policy: &RedirectPolicy,
    captures: &PathCaptures,
) -> (Vec<String>, Vec<(String, String)>) {
    if !policy.lookup_args.is_empty() || !policy.lookup_kwargs.is_empty() {
        return (policy.lookup_args.clone(), policy.lookup_kwargs.clone());
    }
    match captures {
        PathCaptures::Positional(values) => (values.clone(), Vec::new()),
        PathCaptures::Named(pairs) => (Vec::new(), pairs.clone()),
    }
}

/// Substitute `{}` / `{name}` placeholders with sanitized capture values.
///
/// `{{` and `}}` are literal braces. A placeholder with no corresponding
/// capture substitutes as the empty string — absent optional captures are
/// not an error.
fn substitute_captures(template: &str, captures: &PathCaptures) -> String {
    let mut out = String::with_capacity(template.len());
    let mut positional = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                    key.push(inner);
                }
                let value = if key.is_empty() {
                    let value = match captures {
                        PathCaptures::Positional(values) => {
                            values.get(positional).map(String::as_str).unwrap_or("")
                        }
                        PathCaptures::Named(_) => "",
                    };
                    positional += 1;
                    value
                } else {
                    match captures {
                        PathCaptures::Named(pairs) => pairs
                            .iter()
                            .find(|(name, _)| *name == key)
                            .map(|(_, v)| v.as_str())
                            .unwrap_or(""),
                        PathCaptures::Positional(_) => "",
                    }
                };
                out.push_str(&sanitize_capture(value));
            }
            other => out.push(other),
        }
    }

    out
}

/// Step 3: attach the query string per the rule's `query`/`merge_query`.
fn append_query(url: &mut String, policy: &RedirectPolicy, req: &Request) {
    match &policy.query {
        // No override: the original query string rides along verbatim.
        None => {
            if !req.query().is_empty() {
                url.push('?');
                url.push_str(req.query());
            }
        }
        Some(pairs) if policy.merge_query => {
            // Empty override + merge means "merge nothing": originals keep
            // riding along verbatim, same as no override.
            if pairs.is_empty() {
                if !req.query().is_empty() {
                    url.push('?');
                    url.push_str(req.query());
                }
                return;
            }
            let merged = merge_query_string(req.query(), pairs);
            if !merged.is_empty() {
                url.push('?');
                url.push_str(&merged);
            }
        }
        Some(pairs) => {
            // Replace. An empty override strips the query entirely.
            if !pairs.is_empty() {
                url.push('?');
                url.push_str(&encode_pairs(pairs));
            }
        }
    }
}

/// Original parameters first, then the rule's. Repeated keys append rather
/// than replace, so list-valued parameters accumulate.
fn merge_query_string(original: &str, extra: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(original.as_bytes()) {
        serializer.append_pair(&key, &value);
    }
    for (key, value) in extra {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, &str)]) -> PathCaptures {
        PathCaptures::Named(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    fn positional(values: &[&str]) -> PathCaptures {
        PathCaptures::Positional(values.iter().map(|v| (*v).to_string()).collect())
    }

    #[test]
    fn named_substitution() {
        assert_eq!(
            substitute_captures("/donnie/the/{name}/", &named(&[("name", "walrus")])),
            "/donnie/the/walrus/"
        );
    }

    #[test]
    fn positional_substitution_in_order() {
        assert_eq!(
            substitute_captures("/{}/{}/", &positional(&["a", "b"])),
            "/a/b/"
        );
    }

    #[test]
    fn missing_captures_substitute_empty() {
        assert_eq!(
            substitute_captures("/donnie/the{}/", &positional(&[""])),
            "/donnie/the/"
        );
        assert_eq!(
            substitute_captures("/x/{nope}/", &named(&[("name", "walrus")])),
            "/x//"
        );
    }

    #[test]
    fn escaped_braces_stay_literal() {
        assert_eq!(
            substitute_captures("/a/{{x}}/{name}", &named(&[("name", "b")])),
            "/a/{x}/b"
        );
    }

    #[test]
    fn substituted_values_are_sanitized() {
        assert_eq!(
            substitute_captures(
                "http://www-archive.mozilla.org/editor/{page}",
                &named(&[("page", "midasdemo/securityprefs.html</span></a>\u{a0}")]),
            ),
            "http://www-archive.mozilla.org/editor/midasdemo/securityprefs.html%C2%A0"
        );
    }

    #[test]
    fn merge_keeps_originals_and_appends() {
        let merged = merge_query_string(
            "hates=the-eagles",
            &[("aggression".to_string(), "not_stand".to_string())],
        );
        assert_eq!(merged, "hates=the-eagles&aggression=not_stand");
    }

    #[test]
    fn merge_appends_repeated_keys() {
        let merged = merge_query_string(
            "tape=creedence",
            &[("tape".to_string(), "seger".to_string())],
        );
        assert_eq!(merged, "tape=creedence&tape=seger");
    }

    #[test]
    fn encode_pairs_escapes_values() {
        assert_eq!(
            encode_pairs(&[("q".to_string(), "a b".to_string())]),
            "q=a+b"
        );
    }
}

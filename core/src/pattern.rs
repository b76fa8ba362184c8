//! Locale-aware path pattern compilation.
//!
//! A [`RulePattern`] wraps a compiled [`regex::Regex`] built from the
//! pattern a rule declared. When locale matching is on, the pattern is
//! rewritten so a leading locale segment (`en/`, `pt-BR/`, …) is matched
//! optionally and captured separately from the rule's own groups.
//!
//! # Capture shape
//!
//! A compiled pattern reports its captures as *named* or *positional*,
//! never both: if the declared pattern contains any named group, only named
//! groups are reported; otherwise the unnamed groups are reported as an
//! ordered list. Optional groups that did not participate in a match report
//! as empty strings. The internal locale group is reserved and never part
//! of the reported shape.

use crate::RedirectError;
use regex::RegexBuilder;

/// Regex fragment for one locale segment: a 2–3 letter language code with
/// an optional 2-letter region (`en`, `pt-BR`, `zh-TW`).
pub(crate) const LOCALE_SEGMENT: &str = "[A-Za-z]{2,3}(?:-[A-Za-z]{2})?";

/// Reserved capture name for the locale segment. Declaring a group with
/// this name in a locale-aware pattern is a duplicate-name regex error,
/// which surfaces as [`RedirectError::InvalidPattern`] at build time.
const LOCALE_GROUP: &str = "locale";

/// Captures extracted from a matched path, excluding the locale group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathCaptures {
    /// Named captures, one entry per named group in declaration order.
    /// Non-participating groups carry an empty string.
    Named(Vec<(String, String)>),
    /// Positional captures from the unnamed groups, in group order.
    /// Empty when the pattern declares no groups at all.
    Positional(Vec<String>),
}

impl PathCaptures {
    /// Returns `true` if no capture values are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Named(pairs) => pairs.is_empty(),
            Self::Positional(values) => values.is_empty(),
        }
    }
}

/// Result of matching a path against a [`RulePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// The rule's own captures (named XOR positional).
    pub captures: PathCaptures,
    /// The locale segment captured from the path, if the pattern is
    /// locale-aware and the path carried one (without the trailing slash).
    pub locale: Option<String>,
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct RulePattern {
    regex: regex::Regex,
    source: String,
    locale_aware: bool,
    named: bool,
}

impl RulePattern {
    /// Compile a pattern with optional regex flags and locale matching.
    ///
    /// Flags: `i` (case-insensitive), `m` (multi-line), `s`
    /// (dot-matches-newline), `x` (ignore whitespace). Anything else is
    /// [`RedirectError::InvalidFlags`].
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::InvalidPattern`] if the (possibly
    /// locale-rewritten) pattern does not compile.
    pub fn compile(
        pattern: &str,
        flags: Option<&str>,
        locale_aware: bool,
    ) -> Result<Self, RedirectError> {
        let expanded = if locale_aware {
            // Paths are matched with the leading slash already stripped, so
            // the declared anchor and any leading slashes move past the
            // optional locale segment.
            let rest = pattern.strip_prefix('^').unwrap_or(pattern);
            let rest = rest.trim_start_matches('/');
            format!("^(?:(?P<{LOCALE_GROUP}>{LOCALE_SEGMENT})/)?{rest}")
        } else {
            pattern.to_string()
        };

        let mut builder = RegexBuilder::new(&expanded);
        for flag in flags.unwrap_or("").chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    return Err(RedirectError::InvalidFlags {
                        flags: other.to_string(),
                    })
                }
            };
        }

        let regex = builder.build().map_err(|e| RedirectError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e.to_string(),
        })?;

        let named = regex
            .capture_names()
            .flatten()
            .any(|name| !(locale_aware && name == LOCALE_GROUP));

        Ok(Self {
            regex,
            source: pattern.to_string(),
            locale_aware,
            named,
        })
    }

    /// The pattern as declared (before locale rewriting).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the declared pattern contains named groups.
    #[must_use]
    pub fn has_named_captures(&self) -> bool {
        self.named
    }

    /// Match a path (leading slash already stripped) and extract captures.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;

        let locale = if self.locale_aware {
            caps.name(LOCALE_GROUP).map(|m| m.as_str().to_string())
        } else {
            None
        };

        let captures = if self.named {
            let pairs = self
                .regex
                .capture_names()
                .flatten()
                .filter(|name| !(self.locale_aware && *name == LOCALE_GROUP))
                .map(|name| {
                    let value = caps.name(name).map_or("", |m| m.as_str());
                    (name.to_string(), value.to_string())
                })
                .collect();
            PathCaptures::Named(pairs)
        } else {
            let values = self
                .regex
                .capture_names()
                .enumerate()
                .skip(1)
                .filter(|(_, name)| name.is_none())
                .map(|(i, _)| caps.get(i).map_or(String::new(), |m| m.as_str().to_string()))
                .collect();
            PathCaptures::Positional(values)
        };

        Some(PathMatch { captures, locale })
    }
}

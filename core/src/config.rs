//! Serde-deserializable rule declarations.
//!
//! These types mirror [`RuleSpec`](crate::RuleSpec) but deserialize from
//! JSON/YAML, so redirect tables can live in config files instead of code.
//! Selector destinations cannot be expressed here — a config rule's `to`
//! is always a template, literal URL, or lookup name.
//!
//! # Example (YAML)
//!
//! ```yaml
//! rules:
//!   - pattern: "^iam/the/walrus/$"
//!     exclude: true
//!   - pattern: "^iam/the/(?P<name>.+)/$"
//!     to: "/donnie/the/{name}/"
//!     permanent: false
//!     vary: [Accept-Language, User-Agent]
//! ```

use crate::{RedirectError, RuleSet, RuleSetBuilder, RuleSpec};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Configuration for a whole [`RuleSet`].
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    /// Rule declarations, in precedence order.
    pub rules: Vec<RuleConfig>,
}

impl RuleSetConfig {
    /// Validate the declarations and push them onto a builder, preserving
    /// order — use this when the host still needs to attach a reverse
    /// lookup before building.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::InvalidConfig`] for structurally invalid
    /// declarations (a rule with both `to` and `exclude`, or neither).
    pub fn into_builder(self, builder: RuleSetBuilder) -> Result<RuleSetBuilder, RedirectError> {
        let specs = self
            .rules
            .into_iter()
            .map(RuleConfig::into_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(builder.rules(specs))
    }

    /// Compile straight to a [`RuleSet`] with no reverse lookup installed.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError`] for invalid declarations or malformed
    /// patterns.
    pub fn build(self) -> Result<RuleSet, RedirectError> {
        self.into_builder(RuleSet::builder())?.build()
    }
}

/// Configuration for one rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// The path pattern.
    pub pattern: String,

    /// Destination: template, literal URL, or lookup name. Absent for
    /// exclusion rules.
    #[serde(default)]
    pub to: Option<String>,

    /// Mark this rule as an exclusion ("never redirect this path").
    #[serde(default)]
    pub exclude: bool,

    /// 301 when true (default), 302 when false.
    #[serde(default = "default_true")]
    pub permanent: bool,

    /// Query override. Keys are serialized in sorted order, so the rendered
    /// query string is deterministic. An empty mapping strips the query.
    #[serde(default)]
    pub query: Option<BTreeMap<String, QueryValue>>,

    /// Merge the query override with the original parameters.
    #[serde(default)]
    pub merge_query: bool,

    /// Fragment appended after any query string.
    #[serde(default)]
    pub anchor: Option<String>,

    /// `Cache-Control: max-age` duration, in hours.
    #[serde(default)]
    pub cache_hours: Option<u32>,

    /// Header name(s) to echo into `Vary` — a string or a list.
    #[serde(default)]
    pub vary: Option<OneOrMany>,

    /// Prepend the request's locale prefix to the destination.
    #[serde(default = "default_true")]
    pub prepend_locale: bool,

    /// Match the pattern with an optional leading locale segment.
    #[serde(default = "default_true")]
    pub locale_prefix: bool,

    /// Regex flags (`i`, `m`, `s`, `x`).
    #[serde(default)]
    pub re_flags: Option<String>,

    /// Rule name, for introspection and traces.
    #[serde(default)]
    pub name: Option<String>,

    /// Positional args for the reverse lookup.
    #[serde(default)]
    pub lookup_args: Vec<String>,

    /// Keyword args for the reverse lookup.
    #[serde(default)]
    pub lookup_kwargs: BTreeMap<String, String>,
}

impl RuleConfig {
    /// Convert to a [`RuleSpec`], validating the destination/exclusion
    /// combination.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::InvalidConfig`] if the rule declares both a
    /// destination and `exclude`, or neither.
    pub fn into_spec(self) -> Result<RuleSpec, RedirectError> {
        let mut spec = match (self.to, self.exclude) {
            (Some(to), false) => RuleSpec::redirect(self.pattern.as_str(), to),
            (None, true) => RuleSpec::exclude(self.pattern.as_str()),
            (Some(_), true) => {
                return Err(RedirectError::InvalidConfig {
                    source: format!(
                        "rule \"{}\" declares both a destination and exclude",
                        self.pattern
                    ),
                })
            }
            (None, false) => {
                return Err(RedirectError::InvalidConfig {
                    source: format!(
                        "rule \"{}\" has no destination; set \"to\" or \"exclude: true\"",
                        self.pattern
                    ),
                })
            }
        };

        spec = spec
            .permanent(self.permanent)
            .merge_query(self.merge_query)
            .prepend_locale(self.prepend_locale)
            .locale_prefix(self.locale_prefix);

        if let Some(query) = self.query {
            let pairs: Vec<(String, String)> = query
                .into_iter()
                .flat_map(|(key, value)| {
                    value
                        .into_values()
                        .into_iter()
                        .map(move |v| (key.clone(), v))
                })
                .collect();
            let borrowed: Vec<(&str, &str)> = pairs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            spec = spec.query(&borrowed);
        }
        if let Some(anchor) = self.anchor {
            spec = spec.anchor(anchor);
        }
        if let Some(hours) = self.cache_hours {
            spec = spec.cache_hours(hours);
        }
        if let Some(vary) = self.vary {
            for header in vary.into_values() {
                spec = spec.vary(header);
            }
        }
        if let Some(flags) = self.re_flags {
            spec = spec.re_flags(flags);
        }
        if let Some(name) = self.name {
            spec = spec.name(name);
        }
        if !self.lookup_args.is_empty() {
            let borrowed: Vec<&str> = self.lookup_args.iter().map(String::as_str).collect();
            spec = spec.lookup_args(&borrowed);
        }
        if !self.lookup_kwargs.is_empty() {
            let pairs: Vec<(String, String)> = self.lookup_kwargs.into_iter().collect();
            let borrowed: Vec<(&str, &str)> = pairs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            spec = spec.lookup_kwargs(&borrowed);
        }

        Ok(spec)
    }
}

fn default_true() -> bool {
    true
}

/// A query parameter's value(s): scalar or list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// A single value.
    One(String),
    /// Repeated values for the same key.
    Many(Vec<String>),
}

impl QueryValue {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

/// A string or a list of strings (used for `vary`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single name.
    One(String),
    /// Several names.
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_values(self) -> Vec<String> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

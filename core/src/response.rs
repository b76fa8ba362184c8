//! Redirect response description.
//!
//! The engine stays framework-neutral: a resolved redirect is a
//! [`RedirectAction`] value — status, target URL, and rendered cache/vary
//! header values — which an adapter (e.g. `detour-http`) turns into its
//! framework's response type.

use std::fmt;

/// Redirect status: permanent (301) or temporary (302).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectStatus {
    /// 301 Moved Permanently.
    Permanent,
    /// 302 Found.
    Temporary,
}

impl RedirectStatus {
    /// The HTTP status code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            Self::Permanent => 301,
            Self::Temporary => 302,
        }
    }
}

impl fmt::Display for RedirectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A fully resolved redirect, ready to become an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    /// The computed destination URL (the `Location` header value).
    pub location: String,
    /// 301 or 302.
    pub status: RedirectStatus,
    cache_hours: Option<u32>,
    vary: Vec<String>,
}

impl RedirectAction {
    /// Create an action with no cache or vary headers.
    pub fn new(location: impl Into<String>, status: RedirectStatus) -> Self {
        Self {
            location: location.into(),
            status,
            cache_hours: None,
            vary: Vec::new(),
        }
    }

    /// Cache the redirect for the given number of hours.
    #[must_use]
    pub fn cache_hours(mut self, hours: u32) -> Self {
        self.cache_hours = Some(hours);
        self
    }

    /// Add a header name to echo into `Vary`.
    #[must_use]
    pub fn vary(mut self, header: impl Into<String>) -> Self {
        self.vary.push(header.into());
        self
    }

    /// The `Cache-Control` value, if caching is configured.
    ///
    /// The configured duration is in hours; the header carries seconds.
    #[must_use]
    pub fn cache_control(&self) -> Option<String> {
        self.cache_hours
            .map(|hours| format!("max-age={}", u64::from(hours) * 3600))
    }

    /// The `Vary` value, if any header names are configured.
    #[must_use]
    pub fn vary_header(&self) -> Option<String> {
        if self.vary.is_empty() {
            None
        } else {
            Some(self.vary.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(RedirectStatus::Permanent.code(), 301);
        assert_eq!(RedirectStatus::Temporary.code(), 302);
        assert_eq!(RedirectStatus::Permanent.to_string(), "301");
    }

    #[test]
    fn bare_action_has_no_extra_headers() {
        let action = RedirectAction::new("abides", RedirectStatus::Permanent);
        assert_eq!(action.cache_control(), None);
        assert_eq!(action.vary_header(), None);
    }

    #[test]
    fn cache_hours_render_as_seconds() {
        let action = RedirectAction::new("abides", RedirectStatus::Permanent).cache_hours(2);
        assert_eq!(action.cache_control().as_deref(), Some("max-age=7200"));
    }

    #[test]
    fn vary_joins_names() {
        let action = RedirectAction::new("abides", RedirectStatus::Permanent)
            .vary("Accept-Language")
            .vary("User-Agent");
        assert_eq!(
            action.vary_header().as_deref(),
            Some("Accept-Language, User-Agent")
        );
    }
}

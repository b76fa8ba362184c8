//! Request-inspecting destination selectors.
//!
//! A [`Selector`] is the callable form of a destination: instead of a fixed
//! URL, the rule picks one at request time from request state (usually a
//! header). Selectors are pure — same request, same answer — and the
//! provided implementations only ever read one header.

use crate::Request;
use std::fmt::Debug;

/// Picks a destination URL from the live request.
///
/// Used as the callable destination case: when the matched rule carries a
/// selector, its output becomes the base URL and the locale/query/anchor
/// steps still apply to it.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; selectors live inside the shared
/// rule set.
pub trait Selector: Send + Sync {
    /// Choose a destination for this request.
    fn select(&self, req: &Request) -> String;
}

/// Adapter turning a plain closure into a [`Selector`].
///
/// ```
/// use detour::{FnSelector, Request, Selector};
///
/// let opinion = FnSelector(|_req: &Request| "/just/your/opinion/man".to_string());
/// assert_eq!(opinion.select(&Request::get("/the/dude")), "/just/your/opinion/man");
/// ```
pub struct FnSelector<F>(pub F);

impl<F> Selector for FnSelector<F>
where
    F: Fn(&Request) -> String + Send + Sync,
{
    fn select(&self, req: &Request) -> String {
        (self.0)(req)
    }
}

impl<F> Debug for FnSelector<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FnSelector").finish()
    }
}

/// Two-way selector on a named header's value.
///
/// Substring containment against a token, case-sensitive unless
/// [`ignore_case`](Self::ignore_case) is applied. A missing header never
/// matches.
#[derive(Debug, Clone)]
pub struct HeaderSelector {
    header: String,
    token: String,
    case_sensitive: bool,
    hit: String,
    miss: String,
}

impl HeaderSelector {
    /// Select `hit` when `header`'s value contains `token`, else `miss`.
    pub fn new(
        header: impl Into<String>,
        token: impl Into<String>,
        hit: impl Into<String>,
        miss: impl Into<String>,
    ) -> Self {
        Self {
            header: header.into(),
            token: token.into(),
            case_sensitive: true,
            hit: hit.into(),
            miss: miss.into(),
        }
    }

    /// Match the token case-insensitively.
    #[must_use]
    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

impl Selector for HeaderSelector {
    fn select(&self, req: &Request) -> String {
        let value = req.header(&self.header).unwrap_or("");
        let matched = if self.case_sensitive {
            value.contains(&self.token)
        } else {
            value.to_lowercase().contains(&self.token.to_lowercase())
        };
        if matched {
            self.hit.clone()
        } else {
            self.miss.clone()
        }
    }
}

/// [`HeaderSelector`] specialized to `User-Agent`.
#[derive(Debug, Clone)]
pub struct UserAgentSelector {
    inner: HeaderSelector,
}

impl UserAgentSelector {
    /// Select `hit` when the User-Agent contains `token`, else `miss`.
    pub fn new(token: impl Into<String>, hit: impl Into<String>, miss: impl Into<String>) -> Self {
        Self {
            inner: HeaderSelector::new("user-agent", token, hit, miss),
        }
    }

    /// Match the token case-insensitively.
    #[must_use]
    pub fn ignore_case(mut self) -> Self {
        self.inner = self.inner.ignore_case();
        self
    }
}

impl Selector for UserAgentSelector {
    fn select(&self, req: &Request) -> String {
        self.inner.select(req)
    }
}

/// Gecko-based browsers that carry a Firefox-like token without being
/// Firefox.
const FIREFOX_IMPERSONATORS: &[&str] = &["iceweasel", "seamonkey"];

/// Two-way selector: is the requesting browser actually Firefox?
///
/// Matches only when the User-Agent carries the Firefox product token and
/// none of the known impersonator tokens.
#[derive(Debug, Clone)]
pub struct FirefoxSelector {
    firefox: String,
    other: String,
}

impl FirefoxSelector {
    /// Select `firefox` for Firefox agents, `other` for everything else.
    pub fn new(firefox: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            firefox: firefox.into(),
            other: other.into(),
        }
    }
}

impl Selector for FirefoxSelector {
    fn select(&self, req: &Request) -> String {
        let ua = req.user_agent().unwrap_or("").to_lowercase();
        let is_firefox =
            ua.contains("firefox") && !FIREFOX_IMPERSONATORS.iter().any(|t| ua.contains(t));
        if is_firefox {
            self.firefox.clone()
        } else {
            self.other.clone()
        }
    }
}

const ANDROID_TOKENS: &[&str] = &["android"];
const IOS_TOKENS: &[&str] = &["iphone", "ipad", "ipod"];

/// Three-way selector on the requesting platform.
///
/// Classifies the User-Agent into desktop, Android, or iOS. The mobile
/// token sets are checked before falling back to desktop, so an Android
/// browser that also reports desktop-like tokens is still classified as
/// mobile.
#[derive(Debug, Clone)]
pub struct PlatformSelector {
    desktop: String,
    android: String,
    ios: String,
}

impl PlatformSelector {
    /// Select between `desktop`, `android`, and `ios` destinations.
    pub fn new(
        desktop: impl Into<String>,
        android: impl Into<String>,
        ios: impl Into<String>,
    ) -> Self {
        Self {
            desktop: desktop.into(),
            android: android.into(),
            ios: ios.into(),
        }
    }
}

impl Selector for PlatformSelector {
    fn select(&self, req: &Request) -> String {
        let ua = req.user_agent().unwrap_or("").to_lowercase();
        if ANDROID_TOKENS.iter().any(|t| ua.contains(t)) {
            self.android.clone()
        } else if IOS_TOKENS.iter().any(|t| ua.contains(t)) {
            self.ios.clone()
        } else {
            self.desktop.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ua(ua: &str) -> Request {
        Request::builder()
            .path("/take/comfort/")
            .header("User-Agent", ua)
            .build()
    }

    #[test]
    fn header_selector_hit() {
        let sel = HeaderSelector::new("user-agent", "dude", "/abide/", "/flout/");
        assert_eq!(sel.select(&with_ua("the dude browses")), "/abide/");
    }

    #[test]
    fn header_selector_is_case_sensitive_by_default() {
        let sel = HeaderSelector::new("user-agent", "dude", "/abide/", "/flout/");
        assert_eq!(sel.select(&with_ua("The Dude Browses")), "/flout/");
    }

    #[test]
    fn header_selector_ignore_case() {
        let sel = HeaderSelector::new("user-agent", "dude", "/abide/", "/flout/").ignore_case();
        assert_eq!(sel.select(&with_ua("The Dude Browses")), "/abide/");
    }

    #[test]
    fn header_selector_missing_header_misses() {
        let sel = HeaderSelector::new("user-agent", "dude", "/abide/", "/flout/");
        assert_eq!(sel.select(&Request::get("/take/comfort/")), "/flout/");
    }

    #[test]
    fn user_agent_selector_delegates() {
        let sel = UserAgentSelector::new("dude", "/abide/", "/flout/");
        assert_eq!(sel.select(&with_ua("the dude browses")), "/abide/");
    }

    #[test]
    fn firefox_selector_matches_firefox() {
        let sel = FirefoxSelector::new("/abide/", "/flout/");
        assert_eq!(sel.select(&with_ua("Mozilla Firefox/42.0")), "/abide/");
    }

    #[test]
    fn firefox_selector_rejects_impersonators() {
        let sel = FirefoxSelector::new("/abide/", "/flout/");
        assert_eq!(
            sel.select(&with_ua("Mozilla Firefox/17.0 Iceweasel/17.0.1")),
            "/flout/"
        );
    }

    #[test]
    fn platform_selector_desktop() {
        let sel = PlatformSelector::new("/red/", "/green/", "/blue/");
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:53.0) Gecko/20100101 Firefox/53.0";
        assert_eq!(sel.select(&with_ua(ua)), "/red/");
    }

    #[test]
    fn platform_selector_android() {
        let sel = PlatformSelector::new("/red/", "/green/", "/blue/");
        let ua = "Mozilla/5.0 (Android 6.0.1; Mobile; rv:51.0) Gecko/51.0 Firefox/51.0";
        assert_eq!(sel.select(&with_ua(ua)), "/green/");
    }

    #[test]
    fn platform_selector_ios() {
        let sel = PlatformSelector::new("/red/", "/green/", "/blue/");
        let ua = "Mozilla/5.0 (iPhone; U; CPU iPhone OS 4_3 like Mac OS X; de-de) \
                  AppleWebKit/533.17.9 (KHTML, like Gecko) Mobile/8F190";
        assert_eq!(sel.select(&with_ua(ua)), "/blue/");
    }

    #[test]
    fn fn_selector_wraps_closures() {
        let sel = FnSelector(|_req: &Request| "/just/your/opinion/man".to_string());
        assert_eq!(
            sel.select(&Request::get("/the/dude")),
            "/just/your/opinion/man"
        );
    }

    #[test]
    fn selectors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HeaderSelector>();
        assert_send_sync::<PlatformSelector>();
        assert_send_sync::<FnSelector<fn(&Request) -> String>>();
    }
}

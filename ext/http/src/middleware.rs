//! The redirect middleware hook.

use crate::context::context;
use detour::{Outcome, RedirectStatus, ResolveError, RuleSet};
use http::header::{HeaderValue, CACHE_CONTROL, LOCATION, VARY};
use http::{Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// The middleware entry point: a shared rule set plus
/// [`handle`](Redirects::handle).
///
/// Construct once at startup and call `handle` for every inbound request
/// before normal routing. `Ok(None)` means no rule decided anything — pass
/// the request to the next handler in the chain.
#[derive(Debug, Clone)]
pub struct Redirects {
    rules: Arc<RuleSet>,
}

impl Redirects {
    /// Wrap a rule set.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Wrap an already shared rule set.
    #[must_use]
    pub fn shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// The underlying rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Resolve one request.
    ///
    /// Returns `Ok(Some(response))` with a 301/302 redirect when a redirect
    /// rule matches, `Ok(None)` when no rule matches or an exclusion rule
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError`] when a matched rule's destination cannot be
    /// computed or cannot be carried in a header. Both are 5xx-class
    /// failures for this request, distinct from a pass-through.
    pub fn handle<B>(&self, req: &http::Request<B>) -> Result<Option<Response<()>>, HandleError> {
        let ctx = context(req);
        match self.rules.resolve(&ctx) {
            Ok(Outcome::NoMatch) => Ok(None),
            Ok(Outcome::Excluded) => {
                debug!(path = ctx.path(), "redirect excluded");
                Ok(None)
            }
            Ok(Outcome::Redirect(action)) => {
                debug!(
                    path = ctx.path(),
                    location = action.location.as_str(),
                    status = action.status.code(),
                    "redirecting"
                );
                redirect_response(&action).map(Some)
            }
            Err(err) => {
                warn!(path = ctx.path(), error = %err, "redirect resolution failed");
                Err(HandleError::Resolve(err))
            }
        }
    }
}

fn redirect_response(action: &detour::RedirectAction) -> Result<Response<()>, HandleError> {
    let mut resp = Response::new(());
    *resp.status_mut() = match action.status {
        RedirectStatus::Permanent => StatusCode::MOVED_PERMANENTLY,
        RedirectStatus::Temporary => StatusCode::FOUND,
    };

    let headers = resp.headers_mut();
    headers.insert(LOCATION, header_value(&action.location)?);
    if let Some(cache) = action.cache_control() {
        headers.insert(CACHE_CONTROL, header_value(&cache)?);
    }
    if let Some(vary) = action.vary_header() {
        headers.insert(VARY, header_value(&vary)?);
    }

    Ok(resp)
}

fn header_value(value: &str) -> Result<HeaderValue, HandleError> {
    HeaderValue::from_str(value).map_err(|_| HandleError::InvalidHeaderValue {
        value: value.to_string(),
    })
}

/// Failure to answer a matched redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// The engine could not compute the destination.
    Resolve(ResolveError),
    /// A computed header value contains bytes `http` refuses to carry.
    InvalidHeaderValue {
        /// The offending value.
        value: String,
    },
}

impl fmt::Display for HandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(e) => write!(f, "{e}"),
            Self::InvalidHeaderValue { value } => {
                write!(f, "computed header value is not representable: {value:?}")
            }
        }
    }
}

impl std::error::Error for HandleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve(e) => Some(e),
            Self::InvalidHeaderValue { .. } => None,
        }
    }
}

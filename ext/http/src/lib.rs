//! detour-http: `http`-crate middleware adapter for the detour engine.
//!
//! This crate bridges the framework-neutral engine to real HTTP types:
//!
//! ```text
//! http::Request (runtime)
//!         ↓ context()
//! detour::Request
//!         ↓ RuleSet::resolve()
//! detour::RedirectAction
//!         ↓ Redirects::handle()
//! http::Response with Location / Cache-Control / Vary
//! ```
//!
//! # Example
//!
//! ```
//! use detour::{RuleSet, RuleSpec};
//! use detour_http::Redirects;
//!
//! let rules = RuleSet::builder()
//!     .rule(RuleSpec::redirect(r"^old/$", "/new/"))
//!     .build()
//!     .unwrap();
//! let redirects = Redirects::new(rules);
//!
//! let req = http::Request::get("/old/").body(()).unwrap();
//! let resp = redirects.handle(&req).unwrap().expect("redirect");
//! assert_eq!(resp.status(), 301);
//! assert_eq!(resp.headers()["location"], "/new/");
//!
//! // No rule matched: pass the request through.
//! let req = http::Request::get("/unrelated/").body(()).unwrap();
//! assert!(redirects.handle(&req).unwrap().is_none());
//! ```

mod context;
mod middleware;

pub use context::context;
pub use middleware::{HandleError, Redirects};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{HandleError, Redirects};
    pub use detour::prelude::*;
}

//! `http::Request` → engine context conversion.

use detour::{decode_path, Request};

/// Build the engine's request context from an `http` request.
///
/// The URI path is percent-decoded (lossily — undecodable bytes cannot
/// panic the engine) so patterns match what the client actually addressed;
/// the raw query string is carried verbatim. Header values that are not
/// valid UTF-8 are skipped: the engine's selectors compare text, and a
/// non-text value can never match a text token.
pub fn context<B>(req: &http::Request<B>) -> Request {
    let mut builder = Request::builder()
        .path(decode_path(req.uri().path()))
        .query(req.uri().query().unwrap_or(""));

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            builder = builder.header(name.as_str(), value);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_decoded_and_query_kept_raw() {
        let req = http::Request::get("/%2fexample.com/?x=%2f")
            .body(())
            .unwrap();
        let ctx = context(&req);
        assert_eq!(ctx.path(), "//example.com/");
        assert_eq!(ctx.query(), "x=%2f");
    }

    #[test]
    fn headers_carry_over() {
        let req = http::Request::get("/take/comfort/")
            .header("User-Agent", "the dude browses")
            .body(())
            .unwrap();
        let ctx = context(&req);
        assert_eq!(ctx.user_agent(), Some("the dude browses"));
    }

    #[test]
    fn missing_query_is_empty() {
        let req = http::Request::get("/take/comfort/").body(()).unwrap();
        assert_eq!(context(&req).query(), "");
    }
}

use cookie::{
    Cookie,
    time::{Duration, OffsetDateTime},
};
use tracing::debug;

use praefectus_app::repository::CookieMap;
use praefectus_types::errors::SessionError;

/// Parses a browser cookie string, `name=value; name2=value2`.
pub fn parse_cookie_string(raw: &str) -> Result<CookieMap, SessionError> {
    let mut cookies = CookieMap::new();

    for cookie in Cookie::split_parse(raw) {
        let cookie = cookie.map_err(|e| SessionError::MalformedCookie(format!("{raw}: {e}")))?;
        cookies.insert(cookie.name().to_string(), cookie.value().to_string());
    }

    if cookies.is_empty() {
        return Err(SessionError::MalformedCookie(raw.to_string()));
    }
    Ok(cookies)
}

/// Value for the `Cookie` request header.
pub fn cookie_header(cookies: &CookieMap) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Applies one `Set-Cookie` header value to the jar.
pub fn apply_set_cookie(cookies: &mut CookieMap, header: &str) {
    apply_set_cookie_at(cookies, header, OffsetDateTime::now_utc());
}

fn apply_set_cookie_at(cookies: &mut CookieMap, header: &str, now: OffsetDateTime) {
    let cookie = match Cookie::parse(header) {
        Ok(cookie) => cookie,
        Err(e) => {
            debug!(error = %e, "Ignoring unparsable Set-Cookie header");
            return;
        }
    };

    if is_removal(&cookie, now) {
        cookies.remove(cookie.name());
    } else {
        cookies.insert(cookie.name().to_string(), cookie.value().to_string());
    }
}

/// `Max-Age` wins over `Expires`. An empty or `deleted` value also removes.
fn is_removal(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    let expired = match (cookie.max_age(), cookie.expires_datetime()) {
        (Some(max_age), _) => max_age <= Duration::ZERO,
        (None, Some(expires)) => expires <= now,
        (None, None) => false,
    };

    expired || cookie.value().is_empty() || cookie.value() == "deleted"
}

use regex::Regex;
use std::sync::LazyLock;

/// Present in a page when the server demands a captcha before continuing.
pub const CAPTCHA_MARKER: &str = r#"data-bot-protect="forced""#;
/// Present in the effective URL once the server has dropped the session.
pub const SESSION_EXPIRED_MARKER: &str = "session_expired=1";
/// Present in the effective URL of any authenticated page.
pub const AUTHENTICATED_MARKER: &str = "game.php";

static CSRF_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta content="(.+?)" name="csrf-token""#).expect("valid regex"));

static ACTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&h=(\w+)").expect("valid regex"));

pub fn csrf_token(body: &str) -> Option<&str> {
    CSRF_TOKEN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// The `h` value pages embed in their action links.
pub fn action_token(body: &str) -> Option<&str> {
    ACTION_TOKEN
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn captcha_required(body: &str) -> bool {
    body.contains(CAPTCHA_MARKER)
}

pub fn session_expired(url: &str) -> bool {
    url.contains(SESSION_EXPIRED_MARKER)
}

pub fn is_authenticated(url: &str) -> bool {
    url.contains(AUTHENTICATED_MARKER)
}

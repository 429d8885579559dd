use rand::Rng;
use reqwest::{
    Client, Method,
    header::{ACCEPT, COOKIE, ORIGIN, REFERER, SET_COOKIE},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use praefectus_app::{
    config::{Config, RequestDelay},
    operator::Operator,
    repository::{CookieMap, CookieStore},
};
use praefectus_types::{Result, errors::SessionError};

use crate::{
    cookies::{apply_set_cookie, cookie_header, parse_cookie_string},
    tokens,
};

const PROBE_PATH: &str = "game.php?screen=overview";
const AJAX_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Connection and retry settings of a [`SessionClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub base_url: String,
    pub user_agent: String,
    pub request_delay: RequestDelay,
    pub max_refresh_attempts: u32,
    pub max_captcha_attempts: u32,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url(),
            user_agent: config.web.user_agent.clone(),
            request_delay: config.bot.delays.request,
            max_refresh_attempts: config.session.max_refresh_attempts,
            max_captcha_attempts: config.session.max_captcha_attempts,
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Page {
    /// Effective URL, after redirects.
    pub url: String,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Call {
    method: Method,
    path: String,
    ajax: bool,
    form: Vec<(String, String)>,
}

impl Call {
    fn screen(path: String) -> Self {
        Self {
            method: Method::GET,
            path,
            ajax: false,
            form: vec![],
        }
    }

    fn ajax(method: Method, path: String, form: Vec<(String, String)>) -> Self {
        Self {
            method,
            path,
            ajax: true,
            form,
        }
    }
}

/// One logged-in game session.
///
/// Owns the cookie set and the tokens the server hands out along the way:
/// the CSRF token, the referer and the action token (`h`) every mutating
/// call has to carry. All of it is updated after each response.
pub struct SessionClient {
    http: Client,
    settings: SessionSettings,
    cookies: CookieMap,
    csrf_token: Option<String>,
    referer: Option<String>,
    action_token: Option<String>,
    captcha_pending: bool,
    cookie_store: Arc<dyn CookieStore>,
    operator: Arc<dyn Operator>,
}

impl SessionClient {
    pub fn new(
        settings: SessionSettings,
        cookie_store: Arc<dyn CookieStore>,
        operator: Arc<dyn Operator>,
    ) -> Result<Self> {
        let http = Client::builder().user_agent(&settings.user_agent).build()?;

        Ok(Self {
            http,
            settings,
            cookies: CookieMap::new(),
            csrf_token: None,
            referer: None,
            action_token: None,
            captcha_pending: false,
            cookie_store,
            operator,
        })
    }

    pub fn cookies(&self) -> &CookieMap {
        &self.cookies
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub fn referer(&self) -> Option<&str> {
        self.referer.as_deref()
    }

    pub fn action_token(&self) -> Option<&str> {
        self.action_token.as_deref()
    }

    pub fn captcha_pending(&self) -> bool {
        self.captcha_pending
    }

    /// Restores the stored session, or asks the operator for a new one when
    /// there is none or it's no longer valid.
    pub async fn connect(&mut self) -> Result<()> {
        match self.cookie_store.load().await? {
            Some(cookies) if !cookies.is_empty() => {
                info!("Loading stored cookies");
                self.cookies = cookies;
                if self.probe().await? {
                    self.cookie_store.save(&self.cookies).await?;
                    return Ok(());
                }
                self.refresh().await
            }
            _ => {
                info!("No stored cookies");
                self.refresh().await
            }
        }
    }

    /// Asks the operator for a cookie string until the session validates,
    /// at most `max_refresh_attempts` times. Valid cookies are persisted.
    pub async fn refresh(&mut self) -> Result<()> {
        let max = self.settings.max_refresh_attempts;

        for attempt in 1..=max {
            let raw = self
                .operator
                .ask_string(
                    "Enter cookie string",
                    None,
                    Some("cookie1=value1; cookie2=value2"),
                )
                .await?;

            match parse_cookie_string(&raw) {
                Ok(cookies) => self.cookies.extend(cookies),
                Err(e) => {
                    warn!(attempt, max, error = %e, "Cookie string rejected");
                    continue;
                }
            }

            if self.probe().await? {
                info!(attempt, "Session refreshed");
                self.cookie_store.save(&self.cookies).await?;
                return Ok(());
            }
            warn!(attempt, max, "Cookies did not validate");
        }

        Err(SessionError::CookiesRejected { attempts: max }.into())
    }

    /// Fetches a screen, then pauses for a random request delay.
    pub async fn get_screen(&mut self, screen: &str, params: &[(&str, String)]) -> Result<Option<Page>> {
        let path = with_params(format!("game.php?screen={screen}"), params);
        let page = self.request(&Call::screen(path)).await?;
        self.pause().await;
        Ok(page)
    }

    /// Runs a GET ajax action against the main screen of a village.
    pub async fn ajax_get(
        &mut self,
        village_id: u32,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Page>> {
        let h = self.require_action_token()?;
        let path = with_params(
            format!("game.php?village={village_id}&ajaxaction={action}&screen=main&h={h}"),
            params,
        );
        self.request(&Call::ajax(Method::GET, path, vec![])).await
    }

    /// Runs a POST ajax action; the action token is appended to `form`.
    pub async fn ajax_post(
        &mut self,
        village_id: u32,
        action: &str,
        mut form: Vec<(String, String)>,
    ) -> Result<Option<Page>> {
        let h = self.require_action_token()?;
        let path =
            format!("game.php?village={village_id}&ajaxaction={action}&type=main&screen=main&h={h}");
        form.push(("h".to_string(), h));
        self.request(&Call::ajax(Method::POST, path, form)).await
    }

    fn require_action_token(&self) -> Result<String, SessionError> {
        self.action_token
            .clone()
            .ok_or(SessionError::MissingActionToken)
    }

    /// Sends a call, recovering from an expired session (refresh, then one
    /// retry) and from captchas (operator acknowledgement, then retry).
    async fn request(&mut self, call: &Call) -> Result<Option<Page>> {
        let mut refreshed = false;
        let mut captchas = 0;

        loop {
            let Some(page) = self.send(call).await? else {
                return Ok(None);
            };

            if tokens::session_expired(&page.url) {
                if refreshed {
                    error!(path = %call.path, "Session expired again after a refresh");
                    return Err(SessionError::SessionExpired.into());
                }
                error!(path = %call.path, "Session expired, refreshing cookies");
                self.refresh().await?;
                refreshed = true;
                continue;
            }

            if tokens::captcha_required(&page.body) {
                self.captcha_pending = true;
                if captchas >= self.settings.max_captcha_attempts {
                    return Err(SessionError::CaptchaUnresolved { attempts: captchas }.into());
                }
                captchas += 1;
                warn!(attempt = captchas, "Captcha detected");
                self.operator
                    .wait_for_enter("Captcha detected, press enter when it is solved")
                    .await?;
                continue;
            }

            self.captcha_pending = false;
            return Ok(Some(page));
        }
    }

    /// One HTTP round trip. Non-2xx answers are logged and yield `None`.
    async fn send(&mut self, call: &Call) -> Result<Option<Page>> {
        let url = format!("{}/{}", self.settings.base_url, call.path);
        debug!(method = %call.method, %url, "Requesting");

        let mut builder = self
            .http
            .request(call.method.clone(), &url)
            .header(ORIGIN, self.settings.base_url.as_str())
            .header("Upgrade-Insecure-Requests", "1");

        if !self.cookies.is_empty() {
            builder = builder.header(COOKIE, cookie_header(&self.cookies));
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("X-CSRF-Token", token.as_str());
        }
        if let Some(referer) = &self.referer {
            builder = builder.header(REFERER, referer.as_str());
        }
        if call.ajax {
            builder = builder
                .header(ACCEPT, AJAX_ACCEPT)
                .header("X-Requested-With", "XMLHttpRequest")
                .header("TribalWars-Ajax", "1");
        }
        if !call.form.is_empty() {
            builder = builder.form(&call.form);
        }

        let response = builder.send().await?;

        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                apply_set_cookie(&mut self.cookies, value);
            }
        }

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), %url, "Request failed");
            return Ok(None);
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        self.track_tokens(&final_url, &body);

        Ok(Some(Page {
            url: final_url,
            body,
        }))
    }

    fn track_tokens(&mut self, url: &str, body: &str) {
        match tokens::csrf_token(body) {
            Some(token) => {
                debug!("Updating CSRF token");
                self.csrf_token = Some(token.to_string());
            }
            None => self.csrf_token = None,
        }

        if let Some(h) = tokens::action_token(body) {
            debug!(h, "Updating action token");
            self.action_token = Some(h.to_string());
        }

        self.referer = Some(url.to_string());
    }

    /// True when the overview screen opens as an authenticated page.
    async fn probe(&mut self) -> Result<bool> {
        let page = self.send(&Call::screen(PROBE_PATH.to_string())).await?;
        self.pause().await;

        let valid = match page {
            Some(page) => tokens::is_authenticated(&page.url) && !tokens::session_expired(&page.url),
            None => false,
        };

        if !valid {
            error!("Current session cache not valid");
        }
        Ok(valid)
    }

    async fn pause(&self) {
        let RequestDelay { min, max } = self.settings.request_delay;
        let seconds = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };

        debug!(seconds, "Sleeping after request");
        tokio::time::sleep(Duration::from_secs_f64(seconds.max(0.0))).await;
    }
}

fn with_params(mut path: String, params: &[(&str, String)]) -> String {
    for (key, value) in params {
        path.push('&');
        path.push_str(key);
        path.push('=');
        path.push_str(value);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_params() {
        let path = with_params(
            "game.php?screen=main".to_string(),
            &[("village", "16278".to_string()), ("mode", "build".to_string())],
        );
        assert_eq!(path, "game.php?screen=main&village=16278&mode=build");
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.web.base_url = Some("http://127.0.0.1:8088/".to_string());
        config.session.max_captcha_attempts = 5;

        let settings = SessionSettings::from_config(&config);

        assert_eq!(settings.base_url, "http://127.0.0.1:8088");
        assert_eq!(settings.max_captcha_attempts, 5);
        assert_eq!(settings.request_delay, config.bot.delays.request);
    }
}

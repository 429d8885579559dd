use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use praefectus_app::{
    config::RequestDelay,
    repository::CookieMap,
    test_utils::tests::{InMemoryCookieStore, MockOperator},
};
use praefectus_web::{SessionClient, SessionSettings};

pub const MAIN_SCREEN: &str = include_str!("../fixtures/main_screen.html");
pub const OVERVIEW_VILLAGES: &str = include_str!("../fixtures/overview_villages.html");
pub const VALID_SID: &str = "good";
pub const VILLAGE_ID: u32 = 16278;

const OVERVIEW: &str = r#"<html><head><meta content="0v3rv13w" name="csrf-token" /></head>
<body><a href="/game.php?village=16278&screen=overview&action=rename&h=a1b2c3">Rename</a></body></html>"#;
const CAPTCHA: &str =
    r#"<html><body><div id="botprotection_quest" data-bot-protect="forced"></div></body></html>"#;
const LOGIN: &str = "<html><body>Please log in</body></html>";

/// A request as the mock server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Knobs and request log of the mock game server.
#[derive(Debug, Default)]
pub struct ServerState {
    /// Upcoming main-screen requests answered with an expired session.
    pub expire_main: usize,
    /// Upcoming main-screen requests answered with a captcha.
    pub captcha_main: usize,
    pub refuse_upgrades: bool,
    /// Sent as `Set-Cookie` with every overview page.
    pub rotate_cookie: Option<String>,
    pub requests: Vec<Recorded>,
}

#[derive(Clone)]
pub struct MockGameServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ServerState>>,
}

impl MockGameServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(ServerState::default()));
        let app = Router::new()
            .route("/game.php", get(game).post(game))
            .route("/", get(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self { addr, state }
    }

    pub fn configure(&self, f: impl FnOnce(&mut ServerState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_for(&self, screen: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.param("screen") == Some(screen) && r.param("ajaxaction").is_none())
            .collect()
    }

    pub fn ajax_requests(&self, action: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.param("ajaxaction") == Some(action))
            .collect()
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            base_url: format!("http://{}", self.addr),
            user_agent: "praefectus-test".to_string(),
            request_delay: RequestDelay { min: 0.0, max: 0.0 },
            max_refresh_attempts: 2,
            max_captcha_attempts: 2,
        }
    }

    pub fn session(&self, cookies: &InMemoryCookieStore, operator: &MockOperator) -> SessionClient {
        self.session_with(self.settings(), cookies, operator)
    }

    pub fn session_with(
        &self,
        settings: SessionSettings,
        cookies: &InMemoryCookieStore,
        operator: &MockOperator,
    ) -> SessionClient {
        SessionClient::new(
            settings,
            Arc::new(cookies.clone()),
            Arc::new(operator.clone()),
        )
        .unwrap()
    }
}

pub fn cookies(raw: &[(&str, &str)]) -> CookieMap {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn has_valid_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.split("; ").any(|pair| pair == format!("sid={VALID_SID}")))
}

async fn login() -> Html<&'static str> {
    Html(LOGIN)
}

async fn game(
    State(state): State<Arc<Mutex<ServerState>>>,
    method: Method,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(Recorded {
        method,
        query: query.clone(),
        headers: headers.clone(),
        body,
    });

    if !has_valid_session(&headers) {
        return Redirect::to("/?session_expired=1").into_response();
    }

    let screen = query.get("screen").map(String::as_str);
    let ajax = query.get("ajaxaction").map(String::as_str);

    match (screen, ajax) {
        (Some("main"), None) => {
            if state.expire_main > 0 {
                state.expire_main -= 1;
                return Redirect::to("/?session_expired=1").into_response();
            }
            if state.captcha_main > 0 {
                state.captcha_main -= 1;
                return Html(CAPTCHA).into_response();
            }
            match query.get("village").map(String::as_str) {
                Some("16278") => Html(MAIN_SCREEN).into_response(),
                _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        }
        (Some("overview"), None) => match &state.rotate_cookie {
            Some(cookie) => ([(header::SET_COOKIE, cookie.clone())], Html(OVERVIEW)).into_response(),
            None => Html(OVERVIEW).into_response(),
        },
        (Some("overview_villages"), None) => Html(OVERVIEW_VILLAGES).into_response(),
        (Some("main"), Some("upgrade_building")) if state.refuse_upgrades => {
            r#"{"error":["Not enough resources"]}"#.into_response()
        }
        (Some("main"), Some("upgrade_building")) => {
            r#"{"success":"Construction order queued","game_data":{}}"#.into_response()
        }
        (Some("main"), Some("build_order_reduce")) => r#"{"success":"Finished"}"#.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

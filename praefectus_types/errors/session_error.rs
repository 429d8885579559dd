use thiserror::Error;

/// Errors raised by the game session protocol.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session cookies rejected after {attempts} attempts")]
    CookiesRejected { attempts: u32 },

    #[error("Captcha still pending after {attempts} acknowledgements")]
    CaptchaUnresolved { attempts: u32 },

    #[error("Session expired again right after a refresh")]
    SessionExpired,

    #[error("Malformed cookie pair {0:?}, expected name=value")]
    MalformedCookie(String),

    #[error("No action token available for a mutating call")]
    MissingActionToken,
}

impl SessionError {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionError::CookiesRejected { .. }
                | SessionError::CaptchaUnresolved { .. }
                | SessionError::SessionExpired
        )
    }
}

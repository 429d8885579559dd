use std::path::PathBuf;
use tracing::debug;

use praefectus_app::repository::{CookieMap, CookieStore};
use praefectus_types::Result;

use crate::{read_optional, write_creating_dirs};

pub const DEFAULT_COOKIES_PATH: &str = "data/cookies.json";

/// Session cookies as a flat JSON object, name to value.
#[derive(Debug, Clone)]
pub struct JsonCookieStore {
    path: PathBuf,
}

impl JsonCookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for JsonCookieStore {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIES_PATH)
    }
}

#[async_trait::async_trait]
impl CookieStore for JsonCookieStore {
    async fn load(&self) -> Result<Option<CookieMap>> {
        let Some(contents) = read_optional(&self.path).await? else {
            debug!(path = %self.path.display(), "No cookie file");
            return Ok(None);
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    async fn save(&self, cookies: &CookieMap) -> Result<()> {
        let contents = serde_json::to_string_pretty(cookies)?;
        write_creating_dirs(&self.path, &contents).await?;
        debug!(path = %self.path.display(), count = cookies.len(), "Cookies saved");
        Ok(())
    }
}

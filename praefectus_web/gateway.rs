use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use praefectus_app::gateway::GameGateway;
use praefectus_game::models::poll::{VillageListing, VillagePoll};
use praefectus_types::{Result, buildings::BuildingName};

use crate::{parser, session::SessionClient};

/// [`GameGateway`] over a live Tribal Wars session.
pub struct TribalWarsGateway {
    session: SessionClient,
}

impl TribalWarsGateway {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }
}

#[async_trait]
impl GameGateway for TribalWarsGateway {
    async fn list_villages(&mut self) -> Result<Vec<VillageListing>> {
        let Some(page) = self.session.get_screen("overview_villages", &[]).await? else {
            return Ok(vec![]);
        };
        Ok(parser::villages_from_overview(&page.body))
    }

    async fn poll_village(&mut self, village_id: u32) -> Result<Option<VillagePoll>> {
        let Some(page) = self
            .session
            .get_screen("main", &[("village", village_id.to_string())])
            .await?
        else {
            return Ok(None);
        };
        let observed_at = Utc::now().timestamp();

        let Some(snapshot) = parser::village_snapshot(&page.body) else {
            warn!(village_id, "Main screen carries no village data");
            return Ok(None);
        };
        if snapshot.id != village_id {
            warn!(village_id, served = snapshot.id, "Server answered for another village");
            return Ok(None);
        }

        let costs = parser::building_costs(&page.body).unwrap_or_else(|| {
            debug!(village_id, "No building costs on main screen");
            Default::default()
        });

        Ok(Some(VillagePoll {
            queue: parser::build_queue(&page.body, observed_at),
            early_finish: parser::early_finish_candidate(&page.body),
            snapshot,
            costs,
            observed_at,
        }))
    }

    async fn upgrade_building(&mut self, village_id: u32, building: BuildingName) -> Result<bool> {
        let form = vec![
            ("id".to_string(), building.key().to_string()),
            ("force".to_string(), "1".to_string()),
            ("destroy".to_string(), "0".to_string()),
            ("source".to_string(), village_id.to_string()),
        ];
        let page = self
            .session
            .ajax_post(village_id, "upgrade_building", form)
            .await?;

        Ok(page.is_some_and(|p| ajax_succeeded(&p.body)))
    }

    async fn finish_early(&mut self, village_id: u32, order_id: u64) -> Result<bool> {
        let params = [("id", order_id.to_string()), ("destroy", "0".to_string())];
        let page = self
            .session
            .ajax_get(village_id, "build_order_reduce", &params)
            .await?;

        Ok(page.is_some_and(|p| ajax_succeeded(&p.body)))
    }
}

/// Ajax answers are JSON; the server reports a refusal with an `error` key.
fn ajax_succeeded(body: &str) -> bool {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("error") {
            Some(error) => {
                warn!(%error, "Server refused the action");
                false
            }
            None => true,
        },
        Ok(_) | Err(_) => {
            warn!("Ajax answer is not a JSON object");
            false
        }
    }
}

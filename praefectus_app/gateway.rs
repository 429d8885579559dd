use async_trait::async_trait;

use praefectus_game::models::poll::{VillageListing, VillagePoll};
use praefectus_types::{Result, buildings::BuildingName};

/// Everything the bot needs from the game server, in typed form.
///
/// Methods take `&mut self`: the session behind a gateway carries mutable
/// tokens and cookies and is driven from a single execution path.
#[async_trait]
pub trait GameGateway: Send {
    /// Villages of the account, deduplicated.
    async fn list_villages(&mut self) -> Result<Vec<VillageListing>>;

    /// Polls a village. `Ok(None)` when the server answered with no usable
    /// village data, which callers treat as "no data this cycle".
    async fn poll_village(&mut self, village_id: u32) -> Result<Option<VillagePoll>>;

    /// Queues the next level of `building`. `Ok(false)` when the server
    /// refused the order.
    async fn upgrade_building(&mut self, village_id: u32, building: BuildingName) -> Result<bool>;

    /// Completes a queued order instantly. `Ok(false)` when refused.
    async fn finish_early(&mut self, village_id: u32, order_id: u64) -> Result<bool>;
}

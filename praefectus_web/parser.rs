use regex::Regex;
use serde_json::Value;
use std::{collections::HashSet, str::FromStr, sync::LazyLock};
use tracing::debug;

use praefectus_game::models::{
    costs::{BuildingCost, CostTable},
    poll::{EarlyFinish, VillageListing},
    queue::{BuildQueue, FinishTime, QueueEntry},
    village::{BuildingLevels, Coordinate, Population, Production, Resources, VillageSnapshot},
};
use praefectus_types::buildings::BuildingName;

// Every extractor here treats a missing pattern as a normal outcome and
// answers with `None` or an empty value.

static VILLAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"php\?village=(\d+)&amp;screen=overview"><span class="icon header village"></span>([^<]*)</a>"#,
    )
    .expect("valid regex")
});
static GAME_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TribalWars\.updateGameData\((.+?)\);").expect("valid regex"));
static QUEUE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<table id="build_queue"(.+?)</table>"#).expect("valid regex"));
static QUEUE_ICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="lit-item">\s*<img src="[^"]*/(\w+)\.png""#).expect("valid regex")
});
static QUEUE_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>\s*[^<\d]*(\d+)").expect("valid regex"));
static QUEUE_ENDTIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-endtime="(\d+)""#).expect("valid regex"));
static BUILDING_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)BuildingMain\.buildings\s*=\s*(\{.+?\});").expect("valid regex")
});
static EARLY_FINISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)(\d+),\s*'BuildInstantFree.+?data-available-from="(\d+)""#)
        .expect("valid regex")
});

/// Villages linked from an overview page, in order of first appearance.
pub fn villages_from_overview(text: &str) -> Vec<VillageListing> {
    let mut seen = HashSet::new();

    VILLAGE_LINK
        .captures_iter(text)
        .filter_map(|c| {
            let id = c[1].parse::<u32>().ok()?;
            let name = html_escape::decode_html_entities(c[2].trim()).into_owned();
            Some(VillageListing { id, name })
        })
        .filter(|listing| seen.insert((listing.id, listing.name.clone())))
        .collect()
}

/// The JSON payload passed to `TribalWars.updateGameData`.
pub fn game_data(text: &str) -> Option<Value> {
    let raw = GAME_DATA.captures(text)?.get(1)?.as_str();
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Game data is not valid JSON");
            None
        }
    }
}

/// Builds the village snapshot out of the embedded game data.
pub fn village_snapshot(text: &str) -> Option<VillageSnapshot> {
    let data = game_data(text)?;
    let village = data.get("village")?;

    let snapshot = snapshot_from_json(village);
    if snapshot.is_none() {
        debug!("Game data has no usable village object");
    }
    snapshot
}

fn snapshot_from_json(village: &Value) -> Option<VillageSnapshot> {
    let coordinate = str_field(village, "coord")
        .and_then(|c| Coordinate::from_str(&c).ok())
        .or_else(|| {
            Some(Coordinate {
                x: i32::try_from(int_field(village, "x")?).ok()?,
                y: i32::try_from(int_field(village, "y")?).ok()?,
            })
        })
        .unwrap_or_default();

    let name = str_field(village, "name").unwrap_or_default();
    let display_name = str_field(village, "display_name").unwrap_or_else(|| name.clone());

    Some(VillageSnapshot {
        id: u32_field(village, "id")?,
        display_name,
        name,
        coordinate,
        player_id: u32_field(village, "player_id").unwrap_or_default(),
        points: u32_field(village, "points").unwrap_or_default(),
        resources: Resources {
            wood: u32_field(village, "wood")?,
            stone: u32_field(village, "stone")?,
            iron: u32_field(village, "iron")?,
        },
        production: Production {
            wood: float_field(village, "wood_prod").unwrap_or_default(),
            stone: float_field(village, "stone_prod").unwrap_or_default(),
            iron: float_field(village, "iron_prod").unwrap_or_default(),
        },
        population: Population {
            current: u32_field(village, "pop")?,
            max: u32_field(village, "pop_max")?,
        },
        storage_max: u32_field(village, "storage_max")?,
        trader_away: u32_field(village, "trader_away").unwrap_or_default(),
        buildings: building_levels(village.get("buildings")?)?,
        is_farm_upgradable: bool_field(village, "is_farm_upgradable").unwrap_or_default(),
    })
}

/// Levels arrive as strings. A building the world doesn't have stays at 0,
/// a value that isn't a level rejects the whole object.
fn building_levels(buildings: &Value) -> Option<BuildingLevels> {
    let mut levels = BuildingLevels::new();

    for building in BuildingName::ALL {
        let Some(value) = buildings.get(building.key()) else {
            continue;
        };
        let level = u8::try_from(coerce_int(value)?).ok()?;
        levels = levels.with_level(building, level);
    }
    Some(levels)
}

/// Entries of the build queue table, in queue order.
///
/// `observed_at` anchors the placeholder finish time of entries whose end
/// time isn't rendered.
pub fn build_queue(text: &str, observed_at: i64) -> BuildQueue {
    let Some(table) = QUEUE_TABLE.captures(text).and_then(|c| c.get(1)) else {
        return BuildQueue::default();
    };
    let table = table.as_str();

    let icons: Vec<_> = QUEUE_ICON.captures_iter(table).collect();
    let mut entries = Vec::with_capacity(icons.len());
    let mut untracked = 0;

    for (i, icon) in icons.iter().enumerate() {
        let (Some(whole), Some(id)) = (icon.get(0), icon.get(1)) else {
            untracked += 1;
            continue;
        };
        let end = icons
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(table.len(), |m| m.start());
        let row = &table[whole.end()..end];

        // Unknown buildings and rows without a level still hold a slot.
        let kind = id.as_str().trim_end_matches(|c: char| c.is_ascii_digit());
        let Ok(building) = BuildingName::from_str(kind) else {
            debug!(icon = id.as_str(), "Queue row with unknown building");
            untracked += 1;
            continue;
        };
        let Some(level) = QUEUE_LEVEL
            .captures(row)
            .and_then(|c| c[1].parse::<u8>().ok())
        else {
            debug!(%building, "Queue row without a level");
            untracked += 1;
            continue;
        };
        let finish = QUEUE_ENDTIME
            .captures(row)
            .and_then(|c| c[1].parse::<i64>().ok())
            .map_or_else(|| FinishTime::estimated_from(observed_at), FinishTime::Exact);

        entries.push(QueueEntry {
            building,
            level,
            finish,
        });
    }

    BuildQueue::new(entries).with_untracked(untracked)
}

/// Price of the next level of every building the main screen lists.
pub fn building_costs(text: &str) -> Option<CostTable> {
    let raw = BUILDING_DATA.captures(text)?.get(1)?.as_str();
    let data: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Building data is not valid JSON");
            return None;
        }
    };

    let table: CostTable = data
        .as_object()?
        .iter()
        .filter_map(|(key, entry)| {
            let building = BuildingName::from_str(key).ok()?;
            // The server refuses these, e.g. missing requirements.
            if entry.get("can_build").and_then(Value::as_bool) == Some(false) {
                return None;
            }
            // Buildings at their maximum level come without a price.
            let cost = BuildingCost::new(
                u32_field(entry, "wood")?,
                u32_field(entry, "stone")?,
                u32_field(entry, "iron")?,
                u32_field(entry, "pop")?,
            );
            Some((building, cost))
        })
        .collect();
    Some(table)
}

/// The running order offered for a free instant finish, if any.
pub fn early_finish_candidate(text: &str) -> Option<EarlyFinish> {
    let captures = EARLY_FINISH.captures(text)?;
    Some(EarlyFinish {
        order_id: captures[1].parse().ok()?,
        available_from: captures[2].parse().ok()?,
    })
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.floor() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn int_field(obj: &Value, key: &str) -> Option<i64> {
    coerce_int(obj.get(key)?)
}

fn u32_field(obj: &Value, key: &str) -> Option<u32> {
    u32::try_from(int_field(obj, key)?).ok()
}

fn float_field(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_field(obj: &Value, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(html_escape::decode_html_entities(s).into_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

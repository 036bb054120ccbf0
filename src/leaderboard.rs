use crate::persistence::ResultsStore;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub total_participants: usize,
    pub entries: Vec<LeaderboardEntry>,
}

/// Parse stored results into a leaderboard, highest score first, at most
/// `limit` entries. Records that aren't JSON are skipped; anything else is
/// kept, with a missing name or score filled in per field. Ties keep their
/// listing order.
pub fn rank_results(records: &[(String, String)], limit: usize) -> Leaderboard {
    let mut scores: Vec<(String, i64)> = records
        .iter()
        .filter_map(|(key, value)| match serde_json::from_str::<Value>(value) {
            Ok(Value::Null) => {
                warn!("Skipping stored result {key}: record is null");
                None
            }
            Ok(stored) => Some(score_entry(&stored)),
            Err(e) => {
                warn!("Failed to parse stored result {key}: {e}");
                None
            }
        })
        .collect();

    scores.sort_by(|a, b| b.1.cmp(&a.1));
    scores.truncate(limit);

    let entries: Vec<LeaderboardEntry> = scores
        .into_iter()
        .enumerate()
        .map(|(index, (name, score))| LeaderboardEntry {
            rank: index + 1,
            name,
            score,
        })
        .collect();

    Leaderboard {
        total_participants: entries.len(),
        entries,
    }
}

fn score_entry(stored: &Value) -> (String, i64) {
    let name = stored
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string();
    let score = stored.get("score").and_then(score_value).unwrap_or(0);
    (name, score)
}

/// Numbers, and strings holding a number, count as scores.
fn score_value(score: &Value) -> Option<i64> {
    match score {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.round() as i64)
            })
        }
        _ => None,
    }
}

/// Read every stored result under `prefix` and rank them.
pub async fn load_leaderboard(
    store: &dyn ResultsStore,
    prefix: &str,
    limit: usize,
) -> Result<Leaderboard> {
    let records = store.list_by_prefix(prefix).await?;
    Ok(rank_results(&records, limit))
}

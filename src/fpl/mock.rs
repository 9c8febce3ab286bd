//! Statically-defined sample payloads, shaped exactly like the upstream API.
//!
//! These are the last-resort fallback when the network and every cache tier
//! come up empty: downstream consumers always receive a schema-shaped
//! payload, flagged as degraded via the envelope. The data is deterministic
//! so tests can assert against it.

use serde_json::{json, Value};

/// Sample bootstrap payload: a recognisable top-player slice plus all twenty
/// Premier League teams.
pub fn bootstrap() -> Value {
  json!({
    "events": [
      { "id": 1, "name": "Gameweek 1", "is_current": true, "is_next": false, "finished": false, "deadline_time": "2025-08-15T17:30:00Z" },
      { "id": 2, "name": "Gameweek 2", "is_current": false, "is_next": true, "finished": false, "deadline_time": "2025-08-22T17:30:00Z" },
      { "id": 3, "name": "Gameweek 3", "is_current": false, "is_next": false, "finished": false, "deadline_time": "2025-08-29T17:30:00Z" }
    ],
    "teams": [
      { "id": 1, "name": "Arsenal", "short_name": "ARS", "strength_overall_home": 1350, "strength_overall_away": 1320 },
      { "id": 2, "name": "Aston Villa", "short_name": "AVL", "strength_overall_home": 1180, "strength_overall_away": 1150 },
      { "id": 3, "name": "Bournemouth", "short_name": "BOU", "strength_overall_home": 1050, "strength_overall_away": 1020 },
      { "id": 4, "name": "Brentford", "short_name": "BRE", "strength_overall_home": 1100, "strength_overall_away": 1070 },
      { "id": 5, "name": "Brighton", "short_name": "BHA", "strength_overall_home": 1150, "strength_overall_away": 1120 },
      { "id": 6, "name": "Chelsea", "short_name": "CHE", "strength_overall_home": 1280, "strength_overall_away": 1250 },
      { "id": 7, "name": "Crystal Palace", "short_name": "CRY", "strength_overall_home": 1080, "strength_overall_away": 1050 },
      { "id": 8, "name": "Everton", "short_name": "EVE", "strength_overall_home": 1020, "strength_overall_away": 990 },
      { "id": 9, "name": "Fulham", "short_name": "FUL", "strength_overall_home": 1090, "strength_overall_away": 1060 },
      { "id": 10, "name": "Ipswich", "short_name": "IPS", "strength_overall_home": 950, "strength_overall_away": 920 },
      { "id": 11, "name": "Leicester", "short_name": "LEI", "strength_overall_home": 980, "strength_overall_away": 950 },
      { "id": 12, "name": "Liverpool", "short_name": "LIV", "strength_overall_home": 1380, "strength_overall_away": 1350 },
      { "id": 13, "name": "Man City", "short_name": "MCI", "strength_overall_home": 1400, "strength_overall_away": 1370 },
      { "id": 14, "name": "Newcastle", "short_name": "NEW", "strength_overall_home": 1200, "strength_overall_away": 1170 },
      { "id": 15, "name": "Nottingham Forest", "short_name": "NFO", "strength_overall_home": 1060, "strength_overall_away": 1030 },
      { "id": 16, "name": "Southampton", "short_name": "SOU", "strength_overall_home": 970, "strength_overall_away": 940 },
      { "id": 17, "name": "Spurs", "short_name": "TOT", "strength_overall_home": 1250, "strength_overall_away": 1220 },
      { "id": 18, "name": "West Ham", "short_name": "WHU", "strength_overall_home": 1130, "strength_overall_away": 1100 },
      { "id": 19, "name": "Wolves", "short_name": "WOL", "strength_overall_home": 1040, "strength_overall_away": 1010 },
      { "id": 20, "name": "Man Utd", "short_name": "MUN", "strength_overall_home": 1220, "strength_overall_away": 1190 }
    ],
    "elements": [
      player(1, "Alisson", "Becker", 12, 1, 55, 142, "5.2", "15.3", 3420, 0, 0, 13, 86, 10, 555),
      player(2, "David", "Raya", 1, 1, 56, 135, "4.8", "22.1", 2880, 0, 0, 16, 46, 6, 569),
      player(101, "Trent", "Alexander-Arnold", 12, 2, 75, 178, "6.2", "45.2", 3150, 2, 12, 13, 0, 18, 892),
      player(102, "William", "Saliba", 1, 2, 60, 156, "5.4", "38.7", 3240, 2, 1, 16, 0, 12, 723),
      player(201, "Mohamed", "Salah", 12, 3, 130, 256, "8.9", "67.3", 3240, 22, 14, 0, 0, 28, 1234),
      player(202, "Bukayo", "Saka", 1, 3, 100, 198, "7.2", "52.1", 2970, 15, 11, 0, 0, 22, 987),
      player(203, "Cole", "Palmer", 6, 3, 105, 214, "7.8", "58.9", 3060, 18, 13, 0, 0, 25, 1098),
      player(301, "Erling", "Haaland", 13, 4, 150, 289, "9.5", "78.4", 3150, 32, 7, 0, 0, 31, 1456),
      player(302, "Alexander", "Isak", 14, 4, 85, 176, "6.4", "34.2", 2790, 19, 5, 0, 0, 18, 823),
      player(303, "Ollie", "Watkins", 2, 4, 90, 189, "6.8", "41.3", 3240, 21, 8, 0, 0, 20, 912)
    ],
    "element_types": [
      { "id": 1, "singular_name": "Goalkeeper" },
      { "id": 2, "singular_name": "Defender" },
      { "id": 3, "singular_name": "Midfielder" },
      { "id": 4, "singular_name": "Forward" }
    ]
  })
}

#[allow(clippy::too_many_arguments)]
fn player(
  id: u64,
  first_name: &str,
  second_name: &str,
  team: u32,
  element_type: u8,
  now_cost: i64,
  total_points: i64,
  form: &str,
  selected_by_percent: &str,
  minutes: i64,
  goals_scored: i64,
  assists: i64,
  clean_sheets: i64,
  saves: i64,
  bonus: i64,
  bps: i64,
) -> Value {
  json!({
    "id": id,
    "first_name": first_name,
    "second_name": second_name,
    "web_name": second_name,
    "team": team,
    "element_type": element_type,
    "now_cost": now_cost,
    "total_points": total_points,
    "event_points": total_points / 38,
    "form": form,
    "selected_by_percent": selected_by_percent,
    "minutes": minutes,
    "goals_scored": goals_scored,
    "assists": assists,
    "clean_sheets": clean_sheets,
    "saves": saves,
    "bonus": bonus,
    "bps": bps,
    "influence": "0.0",
    "creativity": "0.0",
    "threat": "0.0",
    "ict_index": "0.0",
    "news": "",
    "status": "a",
    "transfers_in_event": 0,
    "transfers_out_event": 0,
    "chance_of_playing_next_round": 100
  })
}

/// Ids of the players present in the sample bootstrap, reused by the live
/// and detail payloads so the sample data set is internally consistent.
const SAMPLE_PLAYER_IDS: &[u64] = &[1, 2, 101, 102, 201, 202, 203, 301, 302, 303];

/// Sample fixture list: six gameweeks of ten pairings each.
pub fn fixtures() -> Value {
  let mut fixtures = Vec::new();
  for gw in 1u32..=6 {
    for i in 0u32..10 {
      let team_h = i * 2 + 1;
      let team_a = i * 2 + 2;
      fixtures.push(json!({
        "id": gw * 100 + i,
        "event": gw,
        "team_h": team_h,
        "team_a": team_a,
        "team_h_score": null,
        "team_a_score": null,
        "team_h_difficulty": i % 5 + 1,
        "team_a_difficulty": (i + 2) % 5 + 1,
        "kickoff_time": format!("2025-08-{:02}T14:00:00Z", 16 + (gw - 1) * 7),
        "finished": false,
        "minutes": 0
      }));
    }
  }
  Value::Array(fixtures)
}

/// Sample live-gameweek payload for the sample players.
pub fn gameweek_live(gw: u32) -> Value {
  let elements: Vec<Value> = SAMPLE_PLAYER_IDS
    .iter()
    .map(|id| {
      let seed = id + u64::from(gw);
      json!({
        "id": id,
        "stats": {
          "minutes": 90,
          "goals_scored": seed % 3,
          "assists": (seed / 3) % 2,
          "clean_sheets": (seed + 1) % 2,
          "bonus": seed % 4,
          "bps": 20 + seed % 40,
          "total_points": 2 + seed % 12
        }
      })
    })
    .collect();

  json!({ "elements": elements })
}

/// Sample player-detail payload: five rounds of history plus a short
/// upcoming-fixture list.
pub fn player_detail(id: u64) -> Value {
  let history: Vec<Value> = (1u64..=5)
    .map(|round| {
      json!({
        "element": id,
        "round": round,
        "total_points": 2 + (id + round) % 13,
        "minutes": 90,
        "goals_scored": (id + round) % 3,
        "assists": (id + round) % 2,
        "bonus": (id + round) % 4,
        "bps": 25 + (id + round) % 30,
        "value": 55 + (id % 100),
        "selected": 100_000 + id * 37,
        "transfers_in": 5_000 + id * 11,
        "transfers_out": 2_500 + id * 7
      })
    })
    .collect();

  let fixtures: Vec<Value> = (6u64..=8)
    .map(|gw| {
      json!({
        "id": gw * 100 + id % 10,
        "event": gw,
        "team_h": (id % 20) + 1,
        "team_a": ((id + 1) % 20) + 1,
        "is_home": gw % 2 == 0,
        "difficulty": (id + gw) % 5 + 1,
        "kickoff_time": format!("2025-09-{:02}T14:00:00Z", 6 + (gw - 6) * 7)
      })
    })
    .collect();

  json!({ "fixtures": fixtures, "history": history })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fpl::api_types::{Bootstrap, ElementSummary, Fixture, LiveGameweek};

  // Every sample payload must stay shape-identical to the real schema, so a
  // consumer cannot tell mock data apart structurally.

  #[test]
  fn test_bootstrap_matches_schema() {
    let decoded: Bootstrap = serde_json::from_value(bootstrap()).unwrap();

    assert_eq!(decoded.teams.len(), 20);
    assert_eq!(decoded.elements.len(), 10);
    assert_eq!(decoded.element_types.len(), 4);
    assert!(decoded.events.iter().any(|e| e.is_current));

    // Every sample player belongs to a real team and position.
    for element in &decoded.elements {
      assert!(decoded.teams.iter().any(|t| t.id == element.team));
      assert!((1..=4).contains(&element.element_type));
    }
  }

  #[test]
  fn test_fixtures_match_schema() {
    let decoded: Vec<Fixture> = serde_json::from_value(fixtures()).unwrap();

    assert_eq!(decoded.len(), 60);
    assert!(decoded.iter().all(|f| f.event.is_some()));
    assert!(decoded.iter().all(|f| f.team_h != f.team_a));
  }

  #[test]
  fn test_gameweek_live_matches_schema() {
    let decoded: LiveGameweek = serde_json::from_value(gameweek_live(7)).unwrap();

    assert_eq!(decoded.elements.len(), 10);
    assert!(decoded.elements.iter().all(|e| e.stats.minutes == 90));
  }

  #[test]
  fn test_player_detail_matches_schema() {
    let decoded: ElementSummary = serde_json::from_value(player_detail(201)).unwrap();

    assert_eq!(decoded.history.len(), 5);
    assert_eq!(decoded.fixtures.len(), 3);
    assert!(decoded.history.iter().all(|h| h.element == 201));
  }

  #[test]
  fn test_mock_payloads_are_deterministic() {
    assert_eq!(bootstrap(), bootstrap());
    assert_eq!(fixtures(), fixtures());
    assert_eq!(gameweek_live(3), gameweek_live(3));
    assert_eq!(player_detail(9), player_detail(9));
  }
}

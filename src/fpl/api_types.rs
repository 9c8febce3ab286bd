//! Serde-deserializable types matching the upstream API responses.
//!
//! Only fields the application consumes are modeled; unknown fields are
//! ignored and missing ones default, so upstream additions don't break
//! deserialization of cached payloads.

use serde::{Deserialize, Serialize};

// ============================================================================
// Bootstrap (bootstrap-static/)
// ============================================================================

/// The upstream API's single large reference payload: every player, team,
/// and gameweek for the season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootstrap {
  #[serde(default)]
  pub events: Vec<GameweekEvent>,
  #[serde(default)]
  pub teams: Vec<Team>,
  #[serde(default)]
  pub elements: Vec<Element>,
  #[serde(default)]
  pub element_types: Vec<ElementType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameweekEvent {
  pub id: u32,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub is_current: bool,
  #[serde(default)]
  pub is_next: bool,
  #[serde(default)]
  pub finished: bool,
  pub deadline_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
  pub id: u32,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub short_name: String,
  #[serde(default)]
  pub strength_overall_home: i32,
  #[serde(default)]
  pub strength_overall_away: i32,
}

/// A player. "Element" is the upstream API's name for the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
  pub id: u64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub second_name: String,
  #[serde(default)]
  pub web_name: String,
  #[serde(default)]
  pub team: u32,
  #[serde(default)]
  pub element_type: u8,
  /// Price in tenths of a million pounds (55 = £5.5m).
  #[serde(default)]
  pub now_cost: i64,
  #[serde(default)]
  pub total_points: i64,
  #[serde(default)]
  pub event_points: i64,
  /// Decimal string in the upstream payload, e.g. "7.2".
  #[serde(default)]
  pub form: String,
  #[serde(default)]
  pub selected_by_percent: String,
  #[serde(default)]
  pub minutes: i64,
  #[serde(default)]
  pub goals_scored: i64,
  #[serde(default)]
  pub assists: i64,
  #[serde(default)]
  pub clean_sheets: i64,
  #[serde(default)]
  pub saves: i64,
  #[serde(default)]
  pub bonus: i64,
  #[serde(default)]
  pub bps: i64,
  #[serde(default)]
  pub influence: String,
  #[serde(default)]
  pub creativity: String,
  #[serde(default)]
  pub threat: String,
  #[serde(default)]
  pub ict_index: String,
  #[serde(default)]
  pub news: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub transfers_in_event: i64,
  #[serde(default)]
  pub transfers_out_event: i64,
  pub chance_of_playing_next_round: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementType {
  pub id: u8,
  #[serde(default)]
  pub singular_name: String,
}

// ============================================================================
// Fixtures (fixtures/ and fixtures/?future=1)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
  pub id: u64,
  /// Gameweek number; absent while the fixture is unscheduled.
  pub event: Option<u32>,
  #[serde(default)]
  pub team_h: u32,
  #[serde(default)]
  pub team_a: u32,
  pub team_h_score: Option<i32>,
  pub team_a_score: Option<i32>,
  pub team_h_difficulty: Option<u8>,
  pub team_a_difficulty: Option<u8>,
  pub kickoff_time: Option<String>,
  #[serde(default)]
  pub finished: bool,
  #[serde(default)]
  pub minutes: i32,
}

// ============================================================================
// Live gameweek stats (event/{gw}/live/)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveGameweek {
  #[serde(default)]
  pub elements: Vec<LiveElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveElement {
  pub id: u64,
  #[serde(default)]
  pub stats: LiveStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveStats {
  #[serde(default)]
  pub minutes: i64,
  #[serde(default)]
  pub goals_scored: i64,
  #[serde(default)]
  pub assists: i64,
  #[serde(default)]
  pub clean_sheets: i64,
  #[serde(default)]
  pub bonus: i64,
  #[serde(default)]
  pub bps: i64,
  #[serde(default)]
  pub total_points: i64,
}

// ============================================================================
// Player detail (element-summary/{id}/)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSummary {
  #[serde(default)]
  pub fixtures: Vec<SummaryFixture>,
  #[serde(default)]
  pub history: Vec<HistoryEntry>,
}

/// Upcoming fixture from the player's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFixture {
  pub id: u64,
  pub event: Option<u32>,
  #[serde(default)]
  pub team_h: u32,
  #[serde(default)]
  pub team_a: u32,
  #[serde(default)]
  pub is_home: bool,
  #[serde(default)]
  pub difficulty: u8,
  pub kickoff_time: Option<String>,
}

/// One finished gameweek of a player's season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  #[serde(default)]
  pub element: u64,
  #[serde(default)]
  pub round: u32,
  #[serde(default)]
  pub total_points: i64,
  #[serde(default)]
  pub minutes: i64,
  #[serde(default)]
  pub goals_scored: i64,
  #[serde(default)]
  pub assists: i64,
  #[serde(default)]
  pub bonus: i64,
  #[serde(default)]
  pub bps: i64,
  /// Price that gameweek, in tenths of a million.
  #[serde(default)]
  pub value: i64,
  #[serde(default)]
  pub selected: i64,
  #[serde(default)]
  pub transfers_in: i64,
  #[serde(default)]
  pub transfers_out: i64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_element_tolerates_unknown_and_missing_fields() {
    let value = json!({
      "id": 201,
      "first_name": "Mohamed",
      "second_name": "Salah",
      "team": 12,
      "element_type": 3,
      "now_cost": 130,
      "total_points": 256,
      "form": "8.9",
      "some_future_field": { "nested": true }
    });

    let element: Element = serde_json::from_value(value).unwrap();
    assert_eq!(element.id, 201);
    assert_eq!(element.now_cost, 130);
    assert_eq!(element.form, "8.9");
    assert_eq!(element.selected_by_percent, "");
    assert!(element.chance_of_playing_next_round.is_none());
  }

  #[test]
  fn test_fixture_with_null_event_and_scores() {
    let value = json!({
      "id": 101,
      "event": null,
      "team_h": 1,
      "team_a": 12,
      "team_h_score": null,
      "team_a_score": null,
      "kickoff_time": null,
      "finished": false
    });

    let fixture: Fixture = serde_json::from_value(value).unwrap();
    assert!(fixture.event.is_none());
    assert!(fixture.team_h_score.is_none());
  }

  #[test]
  fn test_live_gameweek_defaults_stats() {
    let value = json!({
      "elements": [
        { "id": 1 },
        { "id": 2, "stats": { "total_points": 9, "minutes": 90 } }
      ]
    });

    let live: LiveGameweek = serde_json::from_value(value).unwrap();
    assert_eq!(live.elements.len(), 2);
    assert_eq!(live.elements[0].stats.total_points, 0);
    assert_eq!(live.elements[1].stats.total_points, 9);
  }
}

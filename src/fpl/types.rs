//! Display-oriented domain types built from the upstream payloads.

use serde::Serialize;
use std::collections::HashMap;

use super::api_types::{Bootstrap, Element, GameweekEvent, Team};

/// Player position, mapped from the upstream `element_type` (1-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Position {
  Goalkeeper,
  Defender,
  Midfielder,
  Forward,
}

impl Position {
  pub fn from_element_type(element_type: u8) -> Option<Self> {
    match element_type {
      1 => Some(Position::Goalkeeper),
      2 => Some(Position::Defender),
      3 => Some(Position::Midfielder),
      4 => Some(Position::Forward),
      _ => None,
    }
  }

  pub fn short_name(self) -> &'static str {
    match self {
      Position::Goalkeeper => "GKP",
      Position::Defender => "DEF",
      Position::Midfielder => "MID",
      Position::Forward => "FWD",
    }
  }
}

/// Format an upstream price (tenths of a million pounds) for display.
pub fn format_price(now_cost: i64) -> String {
  format!("£{:.1}m", now_cost as f64 / 10.0)
}

/// One player row as the CLI presents it.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerRow {
  pub id: u64,
  pub name: String,
  pub team: String,
  pub position: &'static str,
  /// Price in millions (5.5 = £5.5m).
  pub price: f64,
  pub total_points: i64,
  pub form: f64,
  /// Ownership percentage.
  pub selected_by: f64,
}

impl PlayerRow {
  fn build(element: &Element, teams: &HashMap<u32, &Team>) -> Self {
    let team = teams
      .get(&element.team)
      .map(|t| t.short_name.clone())
      .unwrap_or_else(|| "UNK".to_string());

    Self {
      id: element.id,
      name: format!("{} {}", element.first_name, element.second_name)
        .trim()
        .to_string(),
      team,
      position: Position::from_element_type(element.element_type)
        .map(Position::short_name)
        .unwrap_or("UNK"),
      price: element.now_cost as f64 / 10.0,
      total_points: element.total_points,
      form: element.form.parse().unwrap_or(0.0),
      selected_by: element.selected_by_percent.parse().unwrap_or(0.0),
    }
  }
}

fn team_index(bootstrap: &Bootstrap) -> HashMap<u32, &Team> {
  bootstrap.teams.iter().map(|t| (t.id, t)).collect()
}

/// The season's players ranked by total points.
pub fn top_players(bootstrap: &Bootstrap, limit: usize) -> Vec<PlayerRow> {
  let teams = team_index(bootstrap);
  let mut elements: Vec<&Element> = bootstrap.elements.iter().collect();
  elements.sort_by(|a, b| b.total_points.cmp(&a.total_points));

  elements
    .into_iter()
    .take(limit)
    .map(|e| PlayerRow::build(e, &teams))
    .collect()
}

/// Players ranked by points per unit of price, ignoring anyone cheaper than
/// `min_price` (tenths of a million) to filter out unplayed squad fillers.
pub fn best_value_players(bootstrap: &Bootstrap, limit: usize, min_price: i64) -> Vec<PlayerRow> {
  let teams = team_index(bootstrap);
  let mut elements: Vec<&Element> = bootstrap
    .elements
    .iter()
    .filter(|e| e.now_cost >= min_price)
    .collect();
  elements.sort_by(|a, b| {
    let a_ratio = a.total_points as f64 / a.now_cost.max(1) as f64;
    let b_ratio = b.total_points as f64 / b.now_cost.max(1) as f64;
    b_ratio.partial_cmp(&a_ratio).unwrap_or(std::cmp::Ordering::Equal)
  });

  elements
    .into_iter()
    .take(limit)
    .map(|e| PlayerRow::build(e, &teams))
    .collect()
}

/// The gameweek in progress, falling back to the next one between rounds.
pub fn current_gameweek(bootstrap: &Bootstrap) -> Option<&GameweekEvent> {
  bootstrap
    .events
    .iter()
    .find(|e| e.is_current)
    .or_else(|| bootstrap.events.iter().find(|e| e.is_next))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fpl::mock;

  fn mock_bootstrap() -> Bootstrap {
    serde_json::from_value(mock::bootstrap()).unwrap()
  }

  #[test]
  fn test_format_price() {
    assert_eq!(format_price(55), "£5.5m");
    assert_eq!(format_price(130), "£13.0m");
    assert_eq!(format_price(0), "£0.0m");
  }

  #[test]
  fn test_position_mapping() {
    assert_eq!(Position::from_element_type(1), Some(Position::Goalkeeper));
    assert_eq!(Position::from_element_type(4), Some(Position::Forward));
    assert!(Position::from_element_type(0).is_none());
    assert!(Position::from_element_type(5).is_none());
    assert_eq!(Position::Midfielder.short_name(), "MID");
  }

  #[test]
  fn test_top_players_ranked_by_points() {
    let bootstrap = mock_bootstrap();
    let rows = top_players(&bootstrap, 3);

    assert_eq!(rows.len(), 3);
    assert!(rows[0].total_points >= rows[1].total_points);
    assert!(rows[1].total_points >= rows[2].total_points);
    // Haaland tops the sample data.
    assert_eq!(rows[0].name, "Erling Haaland");
    assert_eq!(rows[0].team, "MCI");
    assert_eq!(rows[0].position, "FWD");
  }

  #[test]
  fn test_best_value_respects_min_price() {
    let bootstrap = mock_bootstrap();
    let rows = best_value_players(&bootstrap, 10, 60);

    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.price >= 6.0));

    // Ratio ordering holds.
    let ratios: Vec<f64> = rows.iter().map(|r| r.total_points as f64 / r.price).collect();
    assert!(ratios.windows(2).all(|w| w[0] >= w[1]));
  }

  #[test]
  fn test_current_gameweek_prefers_is_current() {
    let bootstrap = mock_bootstrap();
    let gw = current_gameweek(&bootstrap).unwrap();
    assert!(gw.is_current || gw.is_next);
  }
}

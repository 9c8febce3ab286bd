mod cache;
mod config;
mod fpl;
mod net;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::{CacheStorage, Enveloped, SourceTier};
use config::Config;
use fpl::types::{format_price, PlayerRow};
use fpl::CachedFplClient;

#[derive(Parser, Debug)]
#[command(name = "fpldata")]
#[command(about = "A caching data client for the Fantasy Premier League API")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/fpldata/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Skip cache freshness checks and hit the network
  #[arg(long)]
  force_refresh: bool,

  /// Emit JSON instead of tables
  #[arg(long)]
  json: bool,

  /// Verbose logging to stderr
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Players ranked by total points
  Players {
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// Rank by points per million instead of raw points
    #[arg(long)]
    value: bool,
  },
  /// Fixture list
  Fixtures {
    /// Only show this gameweek
    #[arg(long)]
    gameweek: Option<u32>,
    /// Only show fixtures that haven't kicked off
    #[arg(long)]
    upcoming: bool,
  },
  /// Live stats for a gameweek (defaults to the current one)
  Live { gameweek: Option<u32> },
  /// Detail and recent history for one player
  Player { id: u64 },
  /// Show the current gameweek
  Gameweek,
  /// Drop every cached payload
  ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing(args.verbose);

  let config = Config::load(args.config.as_deref())?;

  if config.cache.enabled {
    let client = CachedFplClient::new(&config)?;
    run(&client, &args).await
  } else {
    let client = CachedFplClient::without_persistence(&config)?;
    run(&client, &args).await
  }
}

/// Stderr logging filtered by RUST_LOG (or -v), plus a log file under the
/// data dir. The guard must stay alive for the file writer to flush.
fn init_tracing(verbose: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let default_filter = if verbose { "fpldata=debug" } else { "fpldata=warn" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false);

  let log_dir = dirs::data_dir().map(|d| d.join("fpldata"));
  let (file_layer, guard) = match log_dir.filter(|d| std::fs::create_dir_all(d).is_ok()) {
    Some(dir) => {
      let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, "fpldata.log"));
      let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(stderr_layer)
    .with(file_layer)
    .init();

  guard
}

async fn run<S: CacheStorage>(client: &CachedFplClient<S>, args: &Args) -> Result<()> {
  match &args.command {
    Command::Players { limit, value } => {
      if args.force_refresh {
        client.bootstrap(true).await?;
      }
      let players = if *value {
        // Sub-£4.0m players are unplayed bench fodder; keep them out of
        // the value ranking.
        client.best_value_players(*limit, 40).await?
      } else {
        client.top_players(*limit).await?
      };
      degraded_notice(&players);
      print_players(&players.data, args.json)?;
    }

    Command::Fixtures { gameweek, upcoming } => {
      let (bootstrap, fixtures) = if *upcoming {
        futures::try_join!(client.bootstrap(args.force_refresh), client.upcoming_fixtures())?
      } else {
        futures::try_join!(client.bootstrap(args.force_refresh), client.fixtures())?
      };
      degraded_notice(&fixtures);

      let rows: Vec<&fpl::api_types::Fixture> = fixtures
        .data
        .iter()
        .filter(|f| gameweek.map_or(true, |gw| f.event == Some(gw)))
        .collect();
      print_fixtures(&rows, &bootstrap.data.teams, args.json)?;
    }

    Command::Live { gameweek } => {
      let gw = match gameweek {
        Some(gw) => *gw,
        None => client
          .current_gameweek()
          .await?
          .map(|e| e.id)
          .ok_or_else(|| eyre!("No current gameweek; pass one explicitly"))?,
      };

      let (bootstrap, live) =
        futures::try_join!(client.bootstrap(args.force_refresh), client.gameweek_live(gw))?;
      degraded_notice(&live);
      print_live(gw, &live.data, &bootstrap.data, args.json)?;
    }

    Command::Player { id } => {
      let (bootstrap, detail) =
        futures::try_join!(client.bootstrap(args.force_refresh), client.player_detail(*id))?;
      degraded_notice(&detail);
      print_player(*id, &detail.data, &bootstrap.data, args.json)?;
    }

    Command::Gameweek => {
      if args.force_refresh {
        client.bootstrap(true).await?;
      }
      match client.current_gameweek().await? {
        Some(gw) => {
          println!("{} (id {})", gw.name, gw.id);
          if let Some(deadline) = &gw.deadline_time {
            println!("deadline: {}", deadline);
          }
        }
        None => println!("No current or upcoming gameweek"),
      }
    }

    Command::ClearCache => {
      client.clear_cache();
      println!("Cache cleared - next query will fetch fresh data");
    }
  }

  Ok(())
}

/// One-line stderr notice when stale or sample data was served.
fn degraded_notice<T>(envelope: &Enveloped<T>) {
  if !envelope.degraded {
    return;
  }
  if envelope.source == SourceTier::Mock {
    eprintln!("note: upstream unreachable - showing sample data");
  } else {
    eprintln!(
      "note: upstream unreachable - showing {} from {}",
      envelope.source.label(),
      envelope.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );
  }
}

fn print_players(rows: &[PlayerRow], json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(rows)?);
    return Ok(());
  }

  println!(
    "{:<4} {:<24} {:<5} {:<4} {:>7} {:>5} {:>5} {:>6}",
    "id", "name", "team", "pos", "price", "pts", "form", "own%"
  );
  for row in rows {
    println!(
      "{:<4} {:<24} {:<5} {:<4} {:>7} {:>5} {:>5.1} {:>6.1}",
      row.id,
      row.name,
      row.team,
      row.position,
      format_price((row.price * 10.0).round() as i64),
      row.total_points,
      row.form,
      row.selected_by,
    );
  }
  Ok(())
}

fn print_fixtures(
  rows: &[&fpl::api_types::Fixture],
  teams: &[fpl::api_types::Team],
  json: bool,
) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(rows)?);
    return Ok(());
  }

  let names: HashMap<u32, &str> = teams.iter().map(|t| (t.id, t.short_name.as_str())).collect();
  let name = |id: u32| names.get(&id).copied().unwrap_or("UNK");

  for fixture in rows {
    let gw = fixture
      .event
      .map(|e| format!("GW{}", e))
      .unwrap_or_else(|| "TBD".to_string());
    let score = match (fixture.team_h_score, fixture.team_a_score) {
      (Some(h), Some(a)) => format!("{}-{}", h, a),
      _ => "vs".to_string(),
    };
    println!(
      "{:<5} {:>4} {:^5} {:<4}  {}",
      gw,
      name(fixture.team_h),
      score,
      name(fixture.team_a),
      fixture.kickoff_time.as_deref().unwrap_or(""),
    );
  }
  Ok(())
}

fn print_live(
  gw: u32,
  live: &fpl::api_types::LiveGameweek,
  bootstrap: &fpl::api_types::Bootstrap,
  json: bool,
) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(live)?);
    return Ok(());
  }

  let names: HashMap<u64, &str> = bootstrap
    .elements
    .iter()
    .map(|e| (e.id, e.web_name.as_str()))
    .collect();

  let mut elements: Vec<&fpl::api_types::LiveElement> = live.elements.iter().collect();
  elements.sort_by(|a, b| b.stats.total_points.cmp(&a.stats.total_points));

  println!("Gameweek {} live", gw);
  println!(
    "{:<20} {:>4} {:>4} {:>4} {:>5} {:>4}",
    "player", "min", "gls", "ast", "bonus", "pts"
  );
  for element in elements.iter().take(20) {
    let fallback = format!("#{}", element.id);
    let name = names.get(&element.id).copied().unwrap_or(fallback.as_str());
    println!(
      "{:<20} {:>4} {:>4} {:>4} {:>5} {:>4}",
      name,
      element.stats.minutes,
      element.stats.goals_scored,
      element.stats.assists,
      element.stats.bonus,
      element.stats.total_points,
    );
  }
  Ok(())
}

fn print_player(
  id: u64,
  detail: &fpl::api_types::ElementSummary,
  bootstrap: &fpl::api_types::Bootstrap,
  json: bool,
) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(detail)?);
    return Ok(());
  }

  match bootstrap.elements.iter().find(|e| e.id == id) {
    Some(element) => println!(
      "{} {} - {} pts, {}",
      element.first_name,
      element.second_name,
      element.total_points,
      format_price(element.now_cost),
    ),
    None => println!("Player {}", id),
  }

  println!("{:<6} {:>4} {:>4} {:>4} {:>5} {:>7}", "round", "pts", "gls", "ast", "min", "price");
  for entry in detail.history.iter().rev().take(10) {
    println!(
      "GW{:<4} {:>4} {:>4} {:>4} {:>5} {:>7}",
      entry.round,
      entry.total_points,
      entry.goals_scored,
      entry.assists,
      entry.minutes,
      format_price(entry.value),
    );
  }
  Ok(())
}

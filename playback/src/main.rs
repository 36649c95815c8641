use std::path::Path;

use clap::{App, Arg, ArgMatches};
use rootcause::prelude::*;
use serde::Serialize;
use tracing::{Level, info, warn};

use match_playback::deaths::DeathEvent;
use match_playback::drawing::render_heatmap;
use match_playback::heatmap::BoundingBox;
use match_playback::scoreboard::Scoreboard;
use match_playback::{PlaybackConfig, Session};
use match_replays::TelemetryRecord;

/// Pixels per heatmap cell in the exported PNG.
const HEATMAP_CELL_PX: u32 = 4;

#[derive(Serialize)]
struct Snapshot<'a> {
    cursor_ms: i64,
    state: Vec<&'a TelemetryRecord>,
    scoreboard: &'a Scoreboard,
    deaths: &'a [DeathEvent],
    heatmap_bounds: BoundingBox,
}

fn is_integer(v: String) -> Result<(), String> {
    v.parse::<i64>().map(|_| ()).map_err(|e| e.to_string())
}

fn is_number(v: String) -> Result<(), String> {
    v.parse::<f64>().map(|_| ()).map_err(|e| e.to_string())
}

fn cli() -> App<'static, 'static> {
    App::new("Match Playback")
        .about("Scrubs recorded match telemetry and reports state, deaths and heatmaps")
        .arg(
            Arg::with_name("CONFIG")
                .help("Path to a TOML config file")
                .short("c")
                .long("config")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("AT")
                .help("Cursor position in match milliseconds (defaults to the match end)")
                .long("at")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(is_integer),
        )
        .arg(
            Arg::with_name("HEATMAP")
                .help("Write the death heatmap up to the cursor as a PNG")
                .long("heatmap")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("JSON")
                .help("Print the resolved state, scoreboard and deaths as JSON")
                .long("json"),
        )
        .arg(
            Arg::with_name("NO_LOOP")
                .help("Clamp playback at the match end instead of wrapping")
                .long("no-loop"),
        )
        .arg(
            Arg::with_name("LOOKAHEAD")
                .help("Lookahead tolerance in milliseconds for state resolution")
                .long("lookahead")
                .takes_value(true)
                .validator(is_integer),
        )
        .arg(
            Arg::with_name("HEATMAP_RESOLUTION")
                .help("Cells per side of the heatmap grid")
                .long("heatmap-resolution")
                .takes_value(true)
                .validator(is_integer),
        )
        .arg(
            Arg::with_name("SPEED")
                .help("Playback speed multiplier")
                .long("speed")
                .takes_value(true)
                .validator(is_number),
        )
        .arg(
            Arg::with_name("DUMP_CONFIG")
                .help("Print the default config file and exit")
                .long("dump-config"),
        )
        .arg(
            Arg::with_name("VERBOSE")
                .help("Enable debug logging")
                .short("v")
                .long("verbose"),
        )
        .arg(
            Arg::with_name("TELEMETRY")
                .help("The telemetry CSV file to load")
                .required_unless("DUMP_CONFIG")
                .index(1),
        )
}

fn load_config(matches: &ArgMatches) -> Result<PlaybackConfig, Report> {
    let mut config = match matches.value_of("CONFIG") {
        Some(path) => PlaybackConfig::load(Path::new(path))?,
        None => PlaybackConfig::default(),
    };
    config.apply_cli_overrides(matches);
    Ok(config)
}

fn print_scoreboard(board: &Scoreboard) {
    println!(
        "{:<24} {:<10} {:>5} {:>6} {:>7} {:>6}  {}",
        "PLAYER", "TEAM", "KILLS", "DEATHS", "ASSISTS", "HEALTH", "ITEM"
    );
    for row in &board.rows {
        println!(
            "{:<24} {:<10} {:>5} {:>6} {:>7} {:>6.2}  {}{}",
            row.entity_id.as_str(),
            row.team,
            row.kills,
            row.deaths,
            row.assists,
            row.health,
            row.equipped_item,
            if row.alive { "" } else { " (dead)" }
        );
    }
    for team in &board.teams {
        println!(
            "team {}: {} players, {} kills, {} deaths, {} assists",
            team.team, team.players, team.kills, team.deaths, team.assists
        );
    }
}

fn main() -> Result<(), Report> {
    let matches = cli().get_matches();

    let level = if matches.is_present("VERBOSE") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if matches.is_present("DUMP_CONFIG") {
        print!("{}", PlaybackConfig::generate_default_toml());
        return Ok(());
    }

    let config = load_config(&matches)?;
    let Some(telemetry_path) = matches.value_of("TELEMETRY") else {
        eprintln!("{}", matches.usage());
        return Ok(());
    };

    info!("Loading telemetry from {telemetry_path}...");
    let raw = std::fs::read_to_string(telemetry_path).context("Failed to read telemetry file")?;
    let mut session = Session::load_match(&raw, config).context("Failed to load match")?;

    let timeline = session.timeline();
    for warning in timeline.warnings().iter().take(10) {
        warn!("{warning}");
    }
    if timeline.warnings().len() > 10 {
        warn!("... and {} more warnings", timeline.warnings().len() - 10);
    }

    let cursor = match matches.value_of("AT").and_then(|v| v.parse::<i64>().ok()) {
        Some(at) => at,
        None => timeline.match_end(),
    };
    session.seek(cursor);

    println!(
        "match {}..={}ms, cursor {}ms, {} of {} deaths so far",
        session.timeline().match_start(),
        session.timeline().match_end(),
        session.cursor_ms(),
        session.deaths_until_cursor().len(),
        session.death_events().len()
    );
    let board = session.scoreboard();
    print_scoreboard(&board);

    if let Some(output) = matches.value_of("HEATMAP") {
        let field = session.heatmap();
        let image = render_heatmap(field.grid(), HEATMAP_CELL_PX);
        image.save(output).context("Failed to write heatmap image")?;
        info!("Wrote heatmap ({} deaths) to {output}", field.active_events());
    }

    if matches.is_present("JSON") {
        let heatmap_bounds = session.heatmap().bounds();
        let cursor_ms = session.cursor_ms();
        let deaths = session.deaths_until_cursor().to_vec();
        let state = session.state();
        let mut records: Vec<&TelemetryRecord> = state.values().copied().collect();
        records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        let snapshot = Snapshot {
            cursor_ms,
            state: records,
            scoreboard: &board,
            deaths: &deaths,
            heatmap_bounds,
        };
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{json}");
    }

    Ok(())
}

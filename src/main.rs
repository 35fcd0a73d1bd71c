use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Parser;
use log::{error, info};

use satwatch_tracker::{Endpoint, OrbitGroup, PositionMap, TleLoadState, Tracker, TrackerConfig};

#[derive(Parser)]
#[command(name = "satwatch-tracker")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Headless live satellite tracker")]
struct Cli {
    /// Backend base URL (overrides SATWATCH_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Fetch TLE groups straight from CelesTrak instead of the backend
    #[arg(long, conflicts_with = "api_url")]
    celestrak: bool,

    /// Orbit group: LEO, MEO, GEO, Military, Observation or all
    #[arg(short, long)]
    group: Option<OrbitGroup>,

    /// Seconds to keep tracking before exiting
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// Print the predicted ground track of this NORAD id and exit
    #[arg(long)]
    track: Option<u64>,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print_positions(positions: &PositionMap, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(positions)?);
        return Ok(());
    }
    println!("{:>8} {:>9} {:>10} {:>10} {:>8}", "NORAD", "LAT", "LON", "ALT km", "km/s");
    for (id, p) in positions {
        println!(
            "{:>8} {:>9.3} {:>10.3} {:>10.1} {:>8.3}",
            id, p.latitude, p.longitude, p.altitude_km, p.speed_km_s
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = TrackerConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_endpoint(Endpoint::Backend { base_url: url });
    }
    if cli.celestrak {
        config = config.with_endpoint(Endpoint::Celestrak);
    }
    if let Some(group) = cli.group {
        config = config.with_group(group);
    }
    let tick = config.tick_interval;

    let tracker = Tracker::with_http(config);
    tracker.enable().wait();
    match tracker.load_state() {
        TleLoadState::Loaded { count } => info!("{} objects tracked in [{}]", count, tracker.group()),
        TleLoadState::Failed(reason) => {
            error!("could not load TLE group [{}]: {}", tracker.group(), reason);
            return Err(reason.into());
        }
        _ => {}
    }

    if let Some(id) = cli.track {
        let path = tracker
            .ground_track(id, Utc::now())
            .ok_or_else(|| format!("satellite {} is not tracked in [{}]", id, tracker.group()))??;
        if cli.json {
            println!("{}", serde_json::to_string(&path)?);
        } else {
            for (i, segment) in path.segments.iter().enumerate() {
                println!("segment {}", i);
                for (lat, lon) in segment {
                    println!("  {:>9.3} {:>10.3}", lat, lon);
                }
            }
        }
        return Ok(());
    }

    let deadline = Instant::now() + Duration::from_secs(cli.duration);
    while Instant::now() < deadline {
        thread::sleep(tick);
        print_positions(&tracker.positions(), cli.json)?;
    }
    tracker.disable();
    Ok(())
}

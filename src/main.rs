use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use visa_map::codes::{Iso2Code, parse_iso2};
use visa_map::fallback::fallback_table;
use visa_map::fetch::TableSource;
use visa_map::geo::GeoFeatureStore;
use visa_map::map::{MapEvent, WorldMap};
use visa_map::profile::ViewportProfile;
use visa_map::render::{self, AsciiOptions};
use visa_map::search;
use visa_map::selection::SelectionMode;
use visa_map::visa::VisaTable;

#[derive(Parser)]
#[command(name = "visa-map", version, about = "World map colored by visa requirements for a passport")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the visa-status proxy in front of the upstream API
    #[cfg(feature = "net")]
    Serve {
        #[arg(long, env = "VISA_MAP_ADDR", default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,

        #[arg(long, env = "VISA_UPSTREAM_URL", default_value = visa_map::proxy::DEFAULT_UPSTREAM_URL)]
        upstream: String,

        #[arg(long, env = "VISA_FETCH_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Render the map for a passport (and optionally a destination)
    Show(ShowArgs),
    /// Look up countries by name or code
    Search { query: String },
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Passport country code (e.g. "FR")
    #[arg(short, long)]
    passport: Option<String>,

    /// Destination country code
    #[arg(short, long)]
    destination: Option<String>,

    /// Click at canvas coordinates "x,y"; may be repeated
    #[arg(long = "click", value_parser = parse_point, allow_hyphen_values = true)]
    clicks: Vec<[f64; 2]>,

    /// Zoom around the canvas center before replaying clicks
    #[arg(long)]
    zoom: Option<f64>,

    /// Use the small-screen layout
    #[arg(long)]
    mobile: bool,

    /// Map width in characters
    #[arg(short = 'W', long, default_value_t = 100)]
    width: usize,

    /// Map height in characters
    #[arg(short = 'H', long, default_value_t = 35)]
    height: usize,

    /// Plain text output without ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Also write the map as SVG
    #[arg(long, value_name = "FILE")]
    svg: Option<PathBuf>,

    /// GeoJSON file to use instead of the built-in countries. The bundled
    /// set is a coarse demo with a couple dozen outlines; search and visa
    /// tables still cover every country, but only loaded ones are drawn
    /// and clickable.
    #[arg(long, value_name = "PATH")]
    features: Option<PathBuf>,

    /// Base URL of the visa-status proxy
    #[arg(long, env = "VISA_API_URL", default_value = "http://127.0.0.1:8080")]
    api: String,

    /// Skip the API and use built-in data
    #[arg(long)]
    offline: bool,

    #[arg(long, env = "VISA_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok([x, y])
}

static GEOJSON: &str = include_str!("../data/countries.geojson");

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        #[cfg(feature = "net")]
        Command::Serve {
            addr,
            upstream,
            timeout_secs,
        } => {
            let config = visa_map::proxy::ProxyConfig {
                addr,
                upstream_url: upstream,
                timeout: std::time::Duration::from_secs(timeout_secs),
            };
            tokio::runtime::Runtime::new()
                .context("failed to start async runtime")?
                .block_on(visa_map::proxy::serve(config))?;
            Ok(())
        }
        Command::Show(args) => show(args),
        Command::Search { query } => {
            let hits = search::search(&query);
            if hits.is_empty() {
                bail!("no country matches {query:?}");
            }
            for entry in hits {
                println!("{}  {}", entry.code, entry.name);
            }
            Ok(())
        }
    }
}

/// Where visa tables come from for `show`.
struct TableLoader {
    #[cfg(feature = "net")]
    api: Option<(tokio::runtime::Runtime, visa_map::fetch::VisaClient)>,
}

impl TableLoader {
    fn new(args: &ShowArgs) -> Result<Self> {
        #[cfg(feature = "net")]
        {
            let api = if args.offline {
                None
            } else {
                let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
                let timeout = std::time::Duration::from_secs(args.timeout_secs);
                let client = visa_map::fetch::VisaClient::new(args.api.clone(), timeout)?;
                Some((runtime, client))
            };
            Ok(Self { api })
        }
        #[cfg(not(feature = "net"))]
        {
            let _ = args;
            Ok(Self {})
        }
    }

    fn load(&self, passport: &Iso2Code) -> (VisaTable, TableSource) {
        #[cfg(feature = "net")]
        if let Some((runtime, client)) = &self.api {
            let outcome = runtime.block_on(client.fetch_or_fallback(passport));
            return (outcome.table, outcome.source);
        }
        (fallback_table(passport), TableSource::Fallback)
    }
}

fn country_code(raw: &str) -> Result<Iso2Code> {
    parse_iso2(raw).with_context(|| format!("invalid country code {raw:?}: expected two letters"))
}

fn show(args: ShowArgs) -> Result<()> {
    let store = match &args.features {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            GeoFeatureStore::from_geojson(&text).with_context(|| format!("failed to load {}", path.display()))?
        }
        None => GeoFeatureStore::from_geojson(GEOJSON).context("built-in country data is invalid")?,
    };
    let profile = if args.mobile {
        ViewportProfile::mobile()
    } else {
        ViewportProfile::desktop()
    };
    let loader = TableLoader::new(&args)?;
    let mut map = WorldMap::new(store, profile, SelectionMode::Cycle);

    if let Some(code) = &args.passport {
        let event = map.select_passport(country_code(code)?);
        handle(&mut map, &loader, event);
    }
    if let Some(code) = &args.destination {
        let event = map.select_destination(country_code(code)?);
        handle(&mut map, &loader, event);
    }
    if let Some(factor) = args.zoom {
        let (w, h) = map.profile().canvas;
        let t = map.zoom_at(factor, [w / 2.0, h / 2.0]);
        tracing::debug!(x = t.x, y = t.y, k = t.k, "zoomed");
    }
    for &click in &args.clicks {
        let event = map.pointer_down(click);
        if event.is_none() {
            tracing::info!(x = click[0], y = click[1], "click hit nothing selectable");
        }
        handle(&mut map, &loader, event);
    }

    let opts = AsciiOptions {
        width: args.width,
        height: args.height,
        ansi: !args.no_color,
    };
    println!("{}", render::to_ascii(&map, opts));
    println!();
    println!("{}", render::legend(&map));

    if let Some(path) = &args.svg {
        std::fs::write(path, render::to_svg(&map)).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote svg");
    }
    Ok(())
}

fn display_name(map: &WorldMap, code: &Iso2Code) -> String {
    let name = search::name_of(code)
        .or_else(|| map.store().name_of(code))
        .unwrap_or("Unknown");
    format!("{name} ({code})")
}

fn handle(map: &mut WorldMap, loader: &TableLoader, event: Option<MapEvent>) {
    let Some(event) = event else {
        return;
    };
    match event {
        MapEvent::FetchVisaTable(ticket) => {
            let passport = ticket.passport().clone();
            let (table, source) = loader.load(&passport);
            if source == TableSource::Fallback {
                println!("Using built-in visa data for {}.", display_name(map, &passport));
            }
            println!("Passport: {}", display_name(map, &passport));
            let refreshed = map.complete_fetch(ticket, table, source);
            handle(map, loader, refreshed);
        }
        MapEvent::ShowDetails {
            passport,
            destination,
            status,
        } => {
            let from = passport.map_or_else(|| "no passport".to_string(), |p| display_name(map, &p));
            let label = status.map_or("No data", |s| s.label());
            println!("{from} -> {}: {label}", display_name(map, &destination));
        }
        MapEvent::HideDetails => {}
        MapEvent::SameCountryWarning(code) => {
            println!("{} is already the passport country.", display_name(map, &code));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn features_help_warns_about_demo_data() {
        let cmd = Cli::command();
        let show = cmd.find_subcommand("show").unwrap();
        let features = show.get_arguments().find(|a| a.get_id() == "features").unwrap();
        let help = features.get_long_help().or(features.get_help()).unwrap().to_string();
        assert!(help.contains("coarse demo"), "{help}");
    }

    #[test]
    fn click_points_parse() {
        assert_eq!(parse_point("12.5, -3"), Ok([12.5, -3.0]));
        assert!(parse_point("12").is_err());
    }

    #[test]
    fn bundled_data_loads() {
        let store = GeoFeatureStore::from_geojson(GEOJSON).unwrap();
        assert!(store.len() > 20);
    }
}

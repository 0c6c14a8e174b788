//! cafemap CLI - find cafés nearby and route to them from the terminal

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cafemap_core::cache::MemoryStore;
use cafemap_core::view::{format_distance, format_duration, ViewModel};
use cafemap_core::{AppConfig, Coordinate, Event, Filter, TravelMode};
use cafemap_services::blocking::{DriverBlocking, ServicesBlocking};
use cafemap_services::driver::DynStore;
use cafemap_services::{Driver, Endpoint, FileStore, FixedGeolocator, Geolocator, ServiceOptions};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cafemap")]
#[command(author, version, about = "Find cafés nearby and route to them", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with app settings (missing fields keep their defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    services: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServiceArgs {
    /// Overpass endpoint: overpass, kumi or a URL
    #[arg(long, global = true, default_value = "overpass")]
    overpass: String,

    /// Nominatim endpoint: nominatim or a URL
    #[arg(long, global = true, default_value = "nominatim")]
    nominatim: String,

    /// OSRM endpoint: osrm or a URL
    #[arg(long, global = true, default_value = "osrm")]
    osrm: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// List cafés around a position, optionally filtered and routed to
    Nearby {
        /// Device position as "lat,lon"; without it the fallback centre is used
        #[arg(long, allow_hyphen_values = true)]
        at: Option<Coordinate>,

        /// Pin the position as if clicked on the map ("lat,lon")
        #[arg(long, allow_hyphen_values = true, conflicts_with = "search")]
        pin: Option<Coordinate>,

        /// Pin the position at the first match of a place search
        #[arg(long)]
        search: Option<String>,

        /// Filters to enable (repeatable): wheelchair, open-hours,
        /// outdoor-seating, smoking, toilet, card
        #[arg(short, long = "filter")]
        filters: Vec<Filter>,

        /// Route to the n-th listed café (1-based)
        #[arg(short, long)]
        route: Option<usize>,

        /// Travel mode: driving or walking
        #[arg(short, long)]
        mode: Option<TravelMode>,

        /// Cache directory (default: <tmp>/cafemap-cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Keep the café cache in memory only
        #[arg(long, conflicts_with = "cache_dir")]
        no_cache: bool,

        /// Print the view model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a place by name
    Geocode {
        /// Free-text query, e.g. "Intramuros, Manila"
        query: String,
    },
    /// Compute a route between two positions
    Route {
        /// Origin as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,

        /// Destination as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,

        /// Travel mode: driving or walking
        #[arg(short, long, default_value = "driving")]
        mode: TravelMode,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    AppConfig::from_json(&json).context("Invalid config")
}

fn service_options(args: &ServiceArgs) -> ServiceOptions {
    ServiceOptions {
        overpass: Endpoint::from_str_or_url(&args.overpass),
        nominatim: Endpoint::from_str_or_url(&args.nominatim),
        osrm: Endpoint::from_str_or_url(&args.osrm),
        request_timeout: std::time::Duration::from_secs(args.timeout),
        ..ServiceOptions::default()
    }
}

fn print_alerts(alerts: Vec<String>) {
    for alert in alerts {
        eprintln!("! {}", alert);
    }
}

fn print_view(view: &ViewModel) {
    if let Some(location) = &view.location {
        let note = if location.fallback {
            " (fallback)"
        } else if location.manual {
            " (pinned)"
        } else {
            ""
        };
        println!("{}: {}{}", location.label, location.coordinate, note);
    }

    let active: Vec<&str> = view
        .filters
        .iter()
        .filter(|f| f.active)
        .map(|f| f.label)
        .collect();
    if !active.is_empty() {
        println!("Filters: {}", active.join(", "));
    }

    println!("\nCafes ({}):", view.list.cards.len());
    if let Some(message) = &view.list.message {
        println!("  {}", message);
    }
    for (i, card) in view.list.cards.iter().enumerate() {
        let mark = if card.active { "*" } else { " " };
        println!("{} {:>3}. {}  [{}]", mark, i + 1, card.name, card.coordinate);
        for row in &card.rows {
            println!("         {}: {}", row.label, row.value);
        }
    }

    if let Some(route) = &view.route {
        println!("\nRoute ({}) to {}", route.mode, route.destination);
        match &route.summary {
            Some(summary) => println!("  {}", summary),
            None if route.pending => println!("  computing..."),
            None => {}
        }
    }

    if view.directions.open && !view.directions.steps.is_empty() {
        println!("\nDirections:");
        for (i, step) in view.directions.steps.iter().enumerate() {
            println!(
                "  {:>3}. {} ({})",
                i + 1,
                step.text,
                format_distance(step.distance_m)
            );
        }
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mut config = load_config(cli.config.as_ref())?;
    let options = service_options(&cli.services);

    match cli.command {
        // ── Nearby ───────────────────────────────────────────────────
        Commands::Nearby {
            at,
            pin,
            search,
            filters,
            route,
            mode,
            cache_dir,
            no_cache,
            json,
        } => {
            if let Some(mode) = mode {
                config.travel_mode = mode;
            }
            let store: DynStore = if no_cache {
                Box::new(MemoryStore::new())
            } else {
                let dir = cache_dir.unwrap_or_else(|| std::env::temp_dir().join("cafemap-cache"));
                info!("Caching cafes in {}", dir.display());
                Box::new(FileStore::new(dir))
            };
            let geolocator: Arc<dyn Geolocator> = match at {
                Some(at) => Arc::new(FixedGeolocator::at(at)),
                None => Arc::new(FixedGeolocator::unavailable()),
            };

            let driver = Driver::with_services(config, &options, store, geolocator)
                .context("Failed to set up services")?;
            let mut host = DriverBlocking::new(driver).context("Failed to start runtime")?;

            let start = Instant::now();
            let pb = spinner("Finding cafes...");
            host.start();
            if let Some(pin) = pin {
                host.dispatch(Event::MapClicked(pin));
            }
            if let Some(query) = search {
                pb.set_message(format!("Searching \"{}\"...", query));
                host.dispatch(Event::SearchSubmitted(query));
            }
            for filter in filters {
                host.dispatch(Event::FilterToggled(filter));
            }
            if let Some(n) = route {
                let cards = host.view().list.cards;
                let card = n
                    .checked_sub(1)
                    .and_then(|i| cards.get(i))
                    .with_context(|| format!("No cafe #{} ({} listed)", n, cards.len()))?;
                pb.set_message(format!("Routing to {}...", card.name));
                host.dispatch(Event::CardClicked(card.coordinate));
                host.dispatch(Event::DirectionsToggled);
            }
            pb.finish_and_clear();
            info!("Done in {:.2?}", start.elapsed());

            print_alerts(host.take_alerts());
            let view = host.view();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&view).context("Failed to serialize view")?
                );
            } else {
                print_view(&view);
            }
        }

        // ── Geocode ──────────────────────────────────────────────────
        Commands::Geocode { query } => {
            let services = ServicesBlocking::new(&options).context("Failed to set up services")?;
            let pb = spinner("Searching...");
            let places = services.search(&query).context("Place search failed")?;
            pb.finish_and_clear();

            if places.is_empty() {
                anyhow::bail!("Location not found.");
            }
            for place in places {
                println!("{}  {}", place.coordinate, place.label);
            }
        }

        // ── Route ────────────────────────────────────────────────────
        Commands::Route { from, to, mode } => {
            let services = ServicesBlocking::new(&options).context("Failed to set up services")?;
            let pb = spinner("Computing route...");
            let route = services
                .route(from, to, mode)
                .context("Could not compute a route")?;
            pb.finish_and_clear();

            println!(
                "{} route: {}, {}",
                mode,
                format_distance(route.distance_m),
                format_duration(route.duration_s)
            );
            for (i, step) in route.instructions.iter().enumerate() {
                println!(
                    "  {:>3}. {} ({})",
                    i + 1,
                    step.text,
                    format_distance(step.distance_m)
                );
            }
        }
    }

    Ok(())
}

//! `skyline` - CLI for the Skyline travel companion backend
//!
//! Runs the decode service and exposes the flight lookup and favorites
//! store from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use skyline::barcode::{self, BarcodeEngine, ScanOptions};
use skyline::cli::{
    Cli, Command, ConfigCommand, DecodeCommand, FavoritesCommand, LookupCommand, ServeCommand,
};
use skyline::flight::AeroDataBoxClient;
use skyline::{
    bcbp, init_logging, server, BoardingPass, Config, Favorites, FlightLookup, RawImage, Storage,
};

/// Stand-in for secrets in `config show` output.
const REDACTED: &str = "<redacted>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::Decode(cmd) => handle_decode(&cmd).await,
        Command::Lookup(cmd) => handle_lookup(&config, &cmd).await,
        Command::Favorites(cmd) => handle_favorites(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    server::serve(&config).await?;
    Ok(())
}

async fn handle_decode(cmd: &DecodeCommand) -> anyhow::Result<()> {
    let bytes = std::fs::read(&cmd.file)
        .with_context(|| format!("failed to read {}", cmd.file.display()))?;

    let barcodes = tokio::task::spawn_blocking(move || {
        let image = RawImage::from_bytes(&bytes)?;
        barcode::engine().scan(&image, ScanOptions::default())
    })
    .await??;

    let passes: Vec<BoardingPass> = barcodes
        .iter()
        .filter_map(|found| bcbp::parse(&found.data))
        .collect();

    if cmd.json {
        let body = serde_json::json!({ "barcodes": barcodes, "boardingPasses": passes });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if barcodes.is_empty() {
        println!("No barcodes found.");
    } else {
        for found in &barcodes {
            println!("{:<12} {}", found.format, found.data);
            if let Some(pass) = bcbp::parse(&found.data) {
                print_boarding_pass(&pass);
            }
        }
    }
    Ok(())
}

fn print_boarding_pass(pass: &BoardingPass) {
    let show = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("  Boarding pass");
    println!("    Passenger: {}", show(pass.passenger.name.as_deref()));
    println!("    Flight:    {}", show(pass.flight.number.as_deref()));
    println!(
        "    Date:      {}",
        pass.flight
            .date
            .map_or_else(|| "-".to_string(), |d| d.to_string())
    );
    println!(
        "    Route:     {} -> {}",
        show(pass.flight.departure.airport.as_deref()),
        show(pass.flight.arrival.airport.as_deref())
    );
    println!("    Seat:      {}", show(pass.seat.as_deref()));
    println!("    PNR:       {}", show(pass.pnr.as_deref()));
    if let Some((flight, date)) = pass.lookup_key() {
        println!("    Times:     skyline lookup {flight} {date}");
    }
}

async fn handle_lookup(config: &Config, cmd: &LookupCommand) -> anyhow::Result<()> {
    let lookup = FlightLookup::<AeroDataBoxClient>::from_config(&config.flight_api)?;
    let times = lookup.flight_times(&cmd.flight, &cmd.date).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&times)?);
    } else {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        println!("Flight {} on {}", cmd.flight, cmd.date);
        println!("  Departure (scheduled): {}", show(&times.departure_time));
        println!("  Departure (actual):    {}", show(&times.departure_actual));
        println!("  Arrival (scheduled):   {}", show(&times.arrival_time));
        println!("  Arrival (actual):      {}", show(&times.arrival_actual));
        println!("  Status:                {}", show(&times.status));
    }
    Ok(())
}

fn handle_favorites(config: &Config, cmd: FavoritesCommand) -> anyhow::Result<()> {
    let storage = Storage::open(config.database_path())?;
    let favorites = Favorites::new(&storage);

    match cmd {
        FavoritesCommand::List { json } => {
            let ids = favorites.ids()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else if ids.is_empty() {
                println!("No favorites.");
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
        FavoritesCommand::Toggle { id } => {
            if favorites.toggle(&id)? {
                println!("Added {id} to favorites.");
            } else {
                println!("Removed {id} from favorites.");
            }
        }
        FavoritesCommand::Check { id } => {
            println!("{}", favorites.contains(&id)?);
        }
        FavoritesCommand::Clear => {
            favorites.clear()?;
            println!("Favorites cleared.");
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let has_key = config
                .flight_api
                .api_key
                .as_deref()
                .is_some_and(|k| !k.is_empty());
            if json {
                let mut shown = config.clone();
                if has_key {
                    shown.flight_api.api_key = Some(REDACTED.to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                let key_state = if has_key { "set" } else { "missing" };
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Listen address:     {}", config.listen_addr());
                println!("  Max body (bytes):   {}", config.server.max_body_bytes);
                println!();
                println!("[Scans]");
                println!("  Output dir:         {}", config.scans.output_dir.display());
                println!();
                println!("[Flight API]");
                println!("  Base URL:           {}", config.flight_api.base_url);
                println!("  API key:            {key_state}");
                println!("  Timeout (secs):     {}", config.flight_api.timeout_secs);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

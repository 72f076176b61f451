use std::fmt::Display;

use clap::Parser;
use image_files::{engine::Client, list_files, EventHandler, LayerPayload};

#[derive(Parser, Debug)]
struct Args {
    /// Address of the engine. Defaults to `DOCKER_HOST`.
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Version of the engine API, like `1.43`.
    #[arg(long)]
    api_version: Option<String>,

    /// Print the listing as JSON.
    #[arg(long)]
    json: bool,

    /// Image name or identifier.
    image: String,
}

struct Logger;

impl EventHandler for Logger {
    fn layer_start(&self, name: &str, payload: LayerPayload) {
        eprintln!("LAYER {name} ({payload})");
    }

    fn layer_skipped(&self, name: &str, cause: &dyn Display) {
        eprintln!("SKIP {name}: {cause}");
    }

    fn export_read_failed(&self, cause: &dyn Display) {
        eprintln!("EXPORT {cause}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut client = match &args.host {
        Some(host) => Client::new(host)?,
        None => Client::from_env()?,
    };

    if let Some(version) = &args.api_version {
        client = client.api_version(version);
    }

    let listing = list_files(&client, &args.image, Logger)?;

    if args.json {
        serde_json::to_writer_pretty(std::io::stdout().lock(), &listing)?;
        println!();
        return Ok(());
    }

    for record in &listing.records {
        let link = match &record.link_target {
            Some(target) => format!(" -> {target}"),
            None => String::new(),
        };

        println!(
            "{} {:>5} {:>5} {:>10} {}{}",
            record.mode_string, record.owner, record.group, record.size, record.path, link
        );
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use log::{warn, LevelFilter};

use ledstrip_bridge::server::{install_signal_handler, ColorServer};
use ledstrip_bridge::{transport, ColorChannel, Config, StripDriver};

#[derive(Parser)]
#[command(name = "ledstrip_bridge")]
#[command(about = "LED strip bridge\n\nReceives color messages over TCP and drives an addressable LED strip.", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON)
    config: String,

    /// Enable debug output (statistics)
    #[arg(long)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long)]
    ddebug: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.ddebug {
        LevelFilter::Trace
    } else if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = Config::load(&cli.config)?;

    // Released when it goes out of scope, after the driver has blanked the strip
    let mut transport = transport::from_config(&config.strip);

    let mut driver = StripDriver::from_config(&mut *transport, &config.strip);
    if driver.initialize().is_err() {
        warn!("Continuing without LED output");
    }

    let debug = cli.debug || cli.ddebug;
    let mut server = ColorServer::new(config.listen.clone(), ColorChannel::new(driver), debug);

    // SIGINT/SIGTERM/SIGHUP stop the loop so the strip gets blanked below
    if let Err(e) = install_signal_handler(server.get_running_flag()) {
        warn!("{:#}", e);
    }

    // Run server (blocks until shutdown)
    let result = server.run();

    // Graceful shutdown - send a black frame to turn off LEDs
    server.shutdown();

    result
}

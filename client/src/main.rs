use clap::Parser;
use client::config::ClientConfig;
use client::input::{InputManager, JoystickInput, WanderBot};
use client::network::Client;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Zone server address (host:port or ws:// URL)
    #[arg(short = 's', long, default_value = "127.0.0.1:8889")]
    server: String,

    /// Display name sent on connect
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Session token for auth_login
    #[arg(long, env = "AUTH_TOKEN")]
    token: Option<String>,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Stop after this many failed reconnects (default: retry forever)
    #[arg(long)]
    max_reconnects: Option<u32>,

    /// Walk around randomly
    #[arg(long)]
    wander: bool,

    /// Seed for --wander
    #[arg(long)]
    seed: Option<u64>,

    /// Keep attacking the nearest monster
    #[arg(long)]
    auto_attack: bool,

    /// Chat lines kept on screen
    #[arg(long, default_value = "10")]
    chat_history: usize,

    /// Client tick rate
    #[arg(long, default_value = "60")]
    fps: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ClientConfig {
        player_name: args.name,
        auth_token: args.token,
        max_reconnects: args.max_reconnects,
        chat_history: args.chat_history,
        ..ClientConfig::default()
    }
    .with_frame_rate(args.fps);

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }

    let wander = args.wander.then(|| match args.seed {
        Some(seed) => WanderBot::new(seed),
        None => WanderBot::from_entropy(),
    });
    let input = InputManager::new(JoystickInput::from_config(&config), wander, args.auto_attack);

    let mut client = Client::new(&args.server, config, input, args.fake_ping)?;
    client.run().await?;

    Ok(())
}

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use carik_irc::{BotError, Config, EventRegistry, Session};

#[derive(Parser)]
#[command(name = "carik-irc")]
#[command(about = "A minimal event-driven IRC bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Nickname (overrides config)
    #[arg(short, long)]
    nick: Option<String>,

    /// Log every raw line read and written
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and run the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => match run_bot(&cli) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Version => {
            println!("carik-irc v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::InitConfig => match init_config(&cli.config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn load_config(cli: &Cli) -> Result<Config, BotError> {
    let mut config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        tracing::warn!("{} not found, using environment and defaults", cli.config);
        Config::load_env()
    };

    if let Some(nick) = &cli.nick {
        config.irc.nick = nick.clone();
    }
    if cli.verbose {
        config.irc.verbose = true;
    }
    config.validate()?;
    Ok(config)
}

fn run_bot(cli: &Cli) -> Result<(), BotError> {
    let config = load_config(cli)?;
    let events = register_events(&config)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;
    rt.block_on(Session::new(config, events).run())
}

fn register_events(config: &Config) -> Result<EventRegistry, BotError> {
    let mut events = EventRegistry::new();

    let channels = config.irc.channels.clone();
    events.on_connect(move |ctx| {
        ctx.join(&channels);
        Ok(())
    });

    events.on_private(r"^echo (.*)", |ctx| {
        let nick = ctx.nick().to_string();
        let text = format!("You said '{}'!", ctx.group(1).unwrap_or_default());
        ctx.msg(&nick, &text);
        Ok(())
    })?;

    events.on_channel(r"^!users$", |ctx| {
        let channel = ctx.channel().to_string();
        let users = ctx.channels.get(&channel).unwrap_or_default().join(", ");
        ctx.msg(&channel, &format!("I can see: {}", users));
        Ok(())
    })?;

    events.on_channel(r"quote", |ctx| {
        let channel = ctx.channel().to_string();
        let text = format!(
            "{} requested a quote: 'Smoking, a subtle form a suicide.' - Vonnegut",
            ctx.nick()
        );
        ctx.msg(&channel, &text);
        Ok(())
    })?;

    // Message sent to a nick or channel that does not exist
    events.on_error(401, |ctx| {
        tracing::warn!("No such nick/channel: {}", ctx.nick());
        Ok(())
    });

    Ok(events)
}

fn init_config(path: &str) -> Result<(), BotError> {
    let config = Config::default();
    let yaml = config.to_yaml()?;

    std::fs::write(path, yaml)
        .map_err(|e| BotError::Config(format!("Failed to write {}: {}", path, e)))?;
    println!("Config written to {}", path);
    Ok(())
}

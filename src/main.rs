//! Flux Nova - ephemeral photo messaging CLI
//!
#![doc = "Flux Nova - ephemeral photo messaging CLI"]
#![doc = "Main entry point for the fluxnova binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fluxnova::cli::{Cli, Commands, FriendsCommand, ProfileCommand};
use fluxnova::commands;
use fluxnova::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Logging in as {}", email);
            commands::auth::login(&config, &email, &password).await?;
        }
        Commands::Register {
            email,
            username,
            password,
        } => {
            tracing::info!("Registering {}", username);
            commands::auth::register(&config, &email, &username, &password).await?;
        }
        Commands::Logout => {
            commands::auth::logout()?;
        }
        Commands::Feed { watch } => {
            if watch {
                tracing::info!("Watching the snap feed");
                commands::feed::watch_feed(&config).await?;
            } else {
                commands::feed::show_feed(&config).await?;
            }
        }
        Commands::View { snap_id, output } => {
            tracing::info!("Opening snap {}", snap_id);
            if let Some(path) = &output {
                tracing::debug!("Writing image to: {}", path.display());
            }
            commands::feed::view_snap(&config, &snap_id, output.as_deref()).await?;
        }
        Commands::Send {
            image,
            recipients,
            duration,
        } => {
            tracing::info!("Sending {} to {} recipient(s)", image.display(), recipients.len());
            commands::send::send_snap(&config, &image, &recipients, duration).await?;
        }
        Commands::Friends { command } => match command {
            FriendsCommand::List => commands::friends::list_friends(&config).await?,
            FriendsCommand::Add { query } => commands::friends::add_friend(&config, &query).await?,
            FriendsCommand::Remove { friend } => {
                commands::friends::remove_friend(&config, &friend).await?
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommand::Show => commands::profile::show_profile()?,
            ProfileCommand::Rename { username } => {
                commands::profile::rename(&config, &username).await?
            }
            ProfileCommand::Picture { path } => {
                commands::profile::set_picture(&config, &path).await?
            }
            ProfileCommand::Delete { yes } => commands::profile::delete_account(&config, yes).await?,
        },
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output for
/// this crate. Logs go to stderr so command output stays pipeable.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "fluxnova=debug"
    } else {
        "fluxnova=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

//! Command-line interface definition for Flux Nova
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, the snap feed, sending snaps,
//! friends and profile management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flux Nova - ephemeral photo messaging from the terminal
///
/// Snaps disappear after they are viewed: opening one shows it for the
/// sender-chosen duration, then marks it seen and drops it from the feed.
#[derive(Parser, Debug, Clone)]
#[command(name = "fluxnova")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Flux Nova
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the session in the OS keyring
    Login {
        /// Account email
        #[arg(short, long, env = "FLUXNOVA_EMAIL")]
        email: String,

        /// Account password
        #[arg(short, long, env = "FLUXNOVA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Public username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "FLUXNOVA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show pending snaps
    Feed {
        /// Keep polling and reprint the feed when it changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Open a snap, show its countdown, and mark it seen
    View {
        /// Identifier of the snap to open
        snap_id: String,

        /// Write the decoded image to this file while it is displayed
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Send an image to one or more friends
    Send {
        /// Image file to send
        #[arg(short, long)]
        image: PathBuf,

        /// Recipient usernames or user ids (repeatable)
        #[arg(short, long = "to", required = true)]
        recipients: Vec<String>,

        /// Display duration in seconds (1-10)
        #[arg(short, long)]
        duration: Option<u32>,
    },

    /// Manage friends
    Friends {
        /// Friends subcommand
        #[command(subcommand)]
        command: FriendsCommand,
    },

    /// Manage your profile
    Profile {
        /// Profile subcommand
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

/// Friend management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum FriendsCommand {
    /// List your friends
    List,

    /// Find a user by (partial) username and add them
    Add {
        /// Username or part of it, case-insensitive
        query: String,
    },

    /// Remove a friend by username or id
    Remove {
        /// Friend username or user id
        friend: String,
    },
}

/// Profile management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Show the logged-in identity
    Show,

    /// Change your username
    Rename {
        /// New username
        username: String,
    },

    /// Replace your profile picture
    Picture {
        /// Image file
        path: PathBuf,
    },

    /// Permanently delete your account
    Delete {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            base_url: None,
            verbose: false,
            json_logs: false,
            command: Commands::Feed { watch: false },
        }
    }
}

//! CLI argument definitions for logpost-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Logpost syslog relay daemon.
///
/// Accepts syslog messages on UDP/TCP listeners, evaluates declarative
/// YAML routing rules, optionally rewrites records, and re-emits them
/// to remote collectors.
#[derive(Parser, Debug)]
#[command(name = "logpost-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate the configuration file and exit without starting the relay.
    #[arg(long)]
    pub validate: bool,
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use mailprobe_lib::{ConfigFile, ProbeOptions};

#[derive(Parser, Debug)]
#[command(name = "mailprobe-cli", version, about = "Best-effort email deliverability probe")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// read addresses from stdin (one per line) and verify each
    #[arg(long)]
    pub stdin: bool,

    /// concurrent probes in --stdin mode
    #[arg(long, default_value_t = 4)]
    pub jobs: usize,

    /// TOML file with an [smtp] section
    #[arg(long, env = "MAILPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// MAIL FROM envelope sender
    #[arg(long = "from")]
    pub mail_from: Option<String>,

    /// name sent with HELO/EHLO
    #[arg(long)]
    pub helo: Option<String>,

    /// SMTP port
    #[arg(long)]
    pub port: Option<u16>,

    /// per-operation timeout (seconds)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// upgrade with STARTTLS when offered (feature `with-starttls`)
    #[arg(long)]
    pub starttls: bool,

    /// resolve candidate hosts with trust-dns instead of the system resolver
    #[cfg(feature = "with-dns")]
    #[arg(long)]
    pub dns: bool,

    /// format: human|json|ndjson
    #[arg(long, default_value = "human")]
    pub format: String,

    /// print the SMTP exchange under each result
    #[arg(long)]
    pub transcript: bool,

    /// more log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// full probe: syntax, host discovery, SMTP dialogue
    Verify { email: String },
    /// syntax report only, no network
    Validate { email: String },
    /// show which candidate host resolves for a domain
    Hosts { domain: String },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    /// Defaults, then `--config`, then `MAILPROBE_*`, then flags.
    pub fn probe_options(&self) -> Result<ProbeOptions> {
        let mut options = ProbeOptions::default();
        if let Some(path) = &self.config {
            let file = ConfigFile::load(path)?;
            options.apply_file(&file);
        }
        options
            .apply_env()
            .context("reading MAILPROBE_* environment")?;
        self.apply_flags(&mut options);
        options.validate().context("invalid probe options")?;
        Ok(options)
    }

    fn apply_flags(&self, options: &mut ProbeOptions) {
        if let Some(from) = &self.mail_from {
            options.mail_from = from.clone();
        }
        if let Some(helo) = &self.helo {
            options.helo_domain = helo.clone();
        }
        if let Some(port) = self.port {
            options.port = port;
        }
        if let Some(secs) = self.timeout {
            options.timeout = Duration::from_secs(secs);
        }
        if self.starttls {
            options.starttls = true;
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[path = "mailprobe-cli/args.rs"]
mod args;
#[path = "mailprobe-cli/output.rs"]
mod output;
#[path = "mailprobe-cli/verify.rs"]
mod verify;

use std::io::{self, BufRead};
use std::process::ExitCode;

use anyhow::{Context, Result};
#[cfg(feature = "with-dns")]
use mailprobe_lib::DnsLookup;
use mailprobe_lib::{
    CandidateResolver, HostResolver, SystemLookup, Verifier, candidate_hosts, validate_syntax,
};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};
use crate::output::{HostRow, Row, ValidateRow, any_failed, write_reports};

// exit codes: 0 all ok, 2 invalid or not deliverable, 1 fatal
fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli);

    #[cfg(feature = "with-dns")]
    if cli.dns {
        let lookup = DnsLookup::from_system_conf().context("reading system DNS configuration")?;
        return run(&cli, CandidateResolver::new(lookup));
    }
    run(&cli, CandidateResolver::new(SystemLookup))
}

fn run<R: HostResolver + Sync>(cli: &Cli, resolver: R) -> Result<ExitCode> {
    if cli.stdin {
        let emails = read_stdin()?;
        let verifier = Verifier::with_resolver(resolver, cli.probe_options()?)?;
        let rows = verify::verify_all(&verifier, &emails, cli.jobs)?;
        return finish(&rows, cli);
    }

    match &cli.cmd {
        Some(Commands::Verify { email }) => {
            let verifier = Verifier::with_resolver(resolver, cli.probe_options()?)?;
            finish(&[verifier.verify(email)], cli)
        }
        Some(Commands::Validate { email }) => {
            let row = ValidateRow {
                email: email.clone(),
                report: validate_syntax(email),
            };
            finish(&[row], cli)
        }
        Some(Commands::Hosts { domain }) => {
            let options = cli.probe_options()?;
            let row = HostRow {
                domain: domain.clone(),
                candidates: candidate_hosts(domain).to_vec(),
                host: resolver.find_smtp_host(domain, options.port, options.timeout),
            };
            finish(&[row], cli)
        }
        None => {
            Cli::clap_command().print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn finish<T: Row>(rows: &[T], cli: &Cli) -> Result<ExitCode> {
    write_reports(rows, &cli.format, cli.transcript)?;
    Ok(if any_failed(rows) {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn read_stdin() -> Result<Vec<String>> {
    let mut emails = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("read stdin")?;
        let email = line.trim();
        if !email.is_empty() {
            emails.push(email.to_string());
        }
    }
    Ok(emails)
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

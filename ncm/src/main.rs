use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ncm::cli::Cli;
use ncm::{CredentialProvider, EnvCredentials, Orchestrator, PromptCredentials, SshSessionClient};

type NcmOrchestrator = Orchestrator<SshSessionClient, Box<dyn CredentialProvider>>;

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn orchestrator(cli: &Cli) -> Result<NcmOrchestrator> {
    let credentials: Box<dyn CredentialProvider> = if cli.prompt_password {
        Box::new(PromptCredentials::ask(None)?)
    } else {
        Box::new(EnvCredentials::from_env())
    };

    let mut client = SshSessionClient::new().with_host_keys(cli.host_keys.into());
    if let Some(ref path) = cli.known_hosts {
        client = client.with_known_hosts(path);
    }

    Ok(Orchestrator::new(client, credentials, &cli.backup_dir).with_jobs(cli.jobs as usize))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let status = ncm::app::run(&cli, || orchestrator(&cli), &mut io::stdout()).await?;
    Ok(status.into())
}

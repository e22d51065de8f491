use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hubctl::ServerEndpoint;

use super::{HubSubcommand, LoadedConfig};

mod implementations;

pub const CMD: &str = "hub";

pub fn new_subcommand() -> HubSubcommand {
    HubSubcommand {
        cmd: clap::Command::new(CMD)
            .about("Interact with the Hub server")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(implementations::command()),
        run_command: Box::new(RunHubCommand),
    }
}

struct RunHubCommand;

#[async_trait]
impl super::RunSubcommand for RunHubCommand {
    async fn run(
        &self,
        config: Arc<LoadedConfig>,
        args: &clap::ArgMatches,
    ) -> anyhow::Result<()> {
        match args.subcommand() {
            Some((implementations::CMD, args)) => implementations::run(&config.config, args).await,
            _ => unreachable!(),
        }
    }
}

/// Connection flags shared by the commands talking to the Hub.
pub fn add_client_args(subcmd: clap::Command) -> clap::Command {
    subcmd
        .arg(
            clap::Arg::new("server")
                .long("server")
                .env("HUB_SERVER")
                .help("Hub server URL, defaults to the server of the default context"),
        )
        .arg(
            clap::Arg::new("token")
                .long("token")
                .env("HUB_TOKEN")
                .hide_env_values(true)
                .help("Bearer token sent to the Hub server"),
        )
        .arg(
            clap::Arg::new("timeout")
                .long("timeout")
                .value_parser(clap::value_parser!(u64))
                .default_value("30")
                .help("Request timeout in seconds, 0 disables it"),
        )
}

pub fn get_endpoint(
    args: &clap::ArgMatches,
    config: &hubctl::Config,
) -> anyhow::Result<ServerEndpoint> {
    let server = args.get_one::<String>("server").map(|s| s.as_str());
    let token = args.get_one::<String>("token").map(|s| s.as_str());
    let timeout = args
        .get_one::<u64>("timeout")
        .copied()
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs);

    let endpoint = ServerEndpoint::resolve(server, token, timeout, config)?;
    log::debug!("Using Hub server {}", endpoint.server);
    Ok(endpoint)
}

use std::sync::Arc;

use hubctl::hub::public::PublicHubClient;
use hubctl::implementations::{get_implementations, new_printer};
use hubctl::HttpClient;

use crate::hubctl_cli::hub::{add_client_args, get_endpoint};

pub const CMD: &str = "get";

const EXAMPLES: &str = "Examples:
  # Show all Implementation revisions in table format
  hubctl hub implementations get

  # Show the revisions of one Implementation in YAML format
  hubctl hub implementations get cap.implementation.gcp.cloudsql.postgresql.install -oyaml";

pub fn command() -> clap::Command {
    let subcmd = clap::Command::new(CMD)
        .about("Displays one or multiple Implementations available on the Hub server")
        .after_help(EXAMPLES)
        .arg(
            clap::Arg::new("path")
                .num_args(0..)
                .help("Implementation paths to show, all Implementations when omitted"),
        );
    add_client_args(new_printer().register_arg(subcmd))
}

pub async fn run(config: &hubctl::Config, args: &clap::ArgMatches) -> anyhow::Result<()> {
    let paths: Vec<String> = args
        .get_many::<String>("path")
        .map(|p| p.cloned().collect())
        .unwrap_or_default();

    let mut printer = new_printer();
    printer.resolve_format(args)?;

    let endpoint = get_endpoint(args, config)?;
    let client = PublicHubClient::new(Arc::new(HttpClient::new(endpoint)?));

    let mut out = std::io::stdout();
    let mut diag = std::io::stderr();
    get_implementations(&client, &paths, &printer, &mut out, &mut diag).await
}

mod get;

pub const CMD: &str = "implementations";

pub fn command() -> clap::Command {
    clap::Command::new(CMD)
        .visible_alias("impl")
        .about("Browse the Implementations published on the Hub")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(get::command())
}

pub async fn run(config: &hubctl::Config, args: &clap::ArgMatches) -> anyhow::Result<()> {
    match args.subcommand() {
        Some((get::CMD, args)) => get::run(config, args).await,
        _ => unreachable!(),
    }
}

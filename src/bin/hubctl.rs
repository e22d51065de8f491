mod hubctl_cli;

use anyhow::Context;
use hubctl_cli::{hub, load_config, HubApp};
use log::LevelFilter;

fn main() {
    stderrlog::new()
        .verbosity(LevelFilter::Trace)
        .init()
        .expect("Failed to initialize logger");

    let r = (|| -> anyhow::Result<()> {
        let config = load_config()?;
        ctrlc::set_handler(move || {
            hubctl::set_cancelled();
        })
        .context("Error setting Ctrl-C handler")?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create async runtime")?;

        runtime.block_on(
            HubApp::new()
                .add_subcommand(hub::new_subcommand())
                .run(config),
        )
    })();

    if let Err(e) = r {
        log::error!("{e:?}");
        std::process::exit(1);
    }
}

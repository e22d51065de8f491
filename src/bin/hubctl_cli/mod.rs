pub mod hub;

use async_trait::async_trait;
use directories::ProjectDirs;
use fxhash::FxHashMap;
use log::LevelFilter;
use smol_str::SmolStr;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

pub const CONFIG_PATH_ENV: &str = "HUBCTL_CONFIG_PATH";

pub struct HubSubcommand {
    cmd: clap::Command,
    run_command: Box<dyn RunSubcommand>,
}

// Cannot use `Fn` trait due to lifetime issues.
#[async_trait]
trait RunSubcommand: Send + Sync {
    async fn run(&self, config: Arc<LoadedConfig>, args: &clap::ArgMatches)
        -> anyhow::Result<()>;
}

struct RunConfigPathSubcommand;

#[async_trait]
impl RunSubcommand for RunConfigPathSubcommand {
    async fn run(
        &self,
        config: Arc<LoadedConfig>,
        _args: &clap::ArgMatches,
    ) -> anyhow::Result<()> {
        println!("{}", config.config_file.display());
        Ok(())
    }
}

pub struct HubApp {
    cmd: clap::Command,
    run_commands: FxHashMap<SmolStr, Box<dyn RunSubcommand>>,
}

pub struct LoadedConfig {
    pub config_file: PathBuf,
    pub config: hubctl::Config,
}

impl HubApp {
    pub const CONFIG_PATH_CMD: &str = "config-path";

    pub fn new() -> Self {
        let mut run_commands: FxHashMap<SmolStr, Box<dyn RunSubcommand>> = FxHashMap::default();
        run_commands.insert(
            Self::CONFIG_PATH_CMD.into(),
            Box::new(RunConfigPathSubcommand),
        );
        Self {
            cmd: clap::Command::new("hubctl")
                .about("Browse the Implementations published on a Hub server.")
                .version(env!("CARGO_PKG_VERSION"))
                .subcommand_required(true)
                .arg_required_else_help(true)
                .arg(clap::Arg::new("debug").long("debug").global(true).action(clap::ArgAction::SetTrue))
                .subcommand(clap::Command::new(Self::CONFIG_PATH_CMD)
                    .about("Get the path of the config file")),
            run_commands,
        }
    }

    pub fn add_subcommand(self, subcmd: HubSubcommand) -> Self {
        let Self {
            mut cmd,
            mut run_commands,
        } = self;
        let name = subcmd.cmd.get_name().into();
        cmd = cmd.subcommand(subcmd.cmd);
        run_commands.insert(name, subcmd.run_command);
        Self { cmd, run_commands }
    }

    pub async fn run(self, config: LoadedConfig) -> anyhow::Result<()> {
        let matches = self.cmd.get_matches();
        if !matches.get_flag("debug") {
            log::set_max_level(LevelFilter::Info);
        }

        let (subcmd, args) = matches.subcommand().expect("Subcommand is required");
        self.run_commands
            .get(subcmd)
            .expect("Subcommand should be present")
            .run(Arc::new(config), args)
            .await
    }
}

impl Default for HubApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_config() -> anyhow::Result<LoadedConfig> {
    let config_file = match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => path.into(),
        None => ProjectDirs::from("", "", "hubctl")
            .ok_or_else(|| anyhow::anyhow!("No home directory"))?
            .config_dir()
            .join("config.yaml"),
    };

    let config: hubctl::Config = match File::open(&config_file) {
        Ok(file) => serde_yaml_ng::from_reader(file)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // Use default config when file is not found
            hubctl::Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(LoadedConfig {
        config_file,
        config,
    })
}

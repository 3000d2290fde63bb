use anyhow::Result;
use clap::{Parser, Subcommand};
use javapack_core::{
    Application, ConfigLoader, DownloadCache, Droplet, Staging, StagingConfig, TomcatInstance,
};
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "javapack", version = "0.1.0", about = "Java web application staging tool")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the components that claim the application
    Detect {
        #[clap(long, help = "Uploaded application directory")]
        app: PathBuf,

        #[clap(long, help = "Staging configuration file")]
        config: Option<PathBuf>,
    },
    /// Stage the application into a droplet directory
    Compile {
        #[clap(long, help = "Uploaded application directory")]
        app: PathBuf,

        #[clap(long, help = "Droplet directory to assemble")]
        droplet: PathBuf,

        #[clap(long, help = "Staging configuration file")]
        config: Option<PathBuf>,

        #[clap(long, help = "Distribution cache directory")]
        cache: Option<PathBuf>,

        #[clap(
            long,
            default_value = "resources/tomcat",
            help = "Resource overlay copied into the container sandbox"
        )]
        resources: PathBuf,
    },
    /// Print the launch command fragments contributed by components
    Release {
        #[clap(long, help = "Uploaded application directory")]
        app: PathBuf,

        #[clap(long, help = "Droplet directory")]
        droplet: PathBuf,

        #[clap(long, help = "Staging configuration file")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match cli.command {
        Commands::Detect { app, config } => {
            // Detect never touches the droplet, so any root will do
            let staging =
                build_staging(app, std::env::temp_dir().join("javapack"), config, None, None)
                    .await?;
            for name in staging.detect() {
                println!("{}", name);
            }
        }
        Commands::Compile {
            app,
            droplet,
            config,
            cache,
            resources,
        } => {
            let mut staging = build_staging(app, droplet, config, cache, Some(resources)).await?;
            staging.compile().await?;
        }
        Commands::Release {
            app,
            droplet,
            config,
        } => {
            let mut staging = build_staging(app, droplet, config, None, None).await?;
            for command in staging.release()? {
                println!("{}", command);
            }
        }
    }

    Ok(())
}

async fn build_staging(
    app: PathBuf,
    droplet_root: PathBuf,
    config: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    resources: Option<PathBuf>,
) -> Result<Staging> {
    let config = match config {
        Some(path) => ConfigLoader::from_file(path).await?,
        None => StagingConfig::default(),
    };

    let cache_dir = match cache_dir {
        Some(dir) => dir,
        None => DownloadCache::default_dir()?,
    };
    let cache = DownloadCache::new(cache_dir)?;

    let droplet = Droplet::new(droplet_root, "tomcat");
    let application = Application::new(app);
    let mut tomcat = TomcatInstance::new(droplet, application, &config.tomcat, cache)?;
    if let Some(resources) = resources {
        tomcat = tomcat.with_resources(resources);
    }

    let mut staging = Staging::new();
    staging.register(Box::new(tomcat));
    Ok(staging)
}

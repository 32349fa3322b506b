use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use rabbitmq_recipe::{config, RabbitMq, Recipe};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[clap(long, global = true, default_value_t = Level::INFO)]
    level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, build and install the part, then write its bin scripts
    Install(PartArgs),

    /// Report the paths of an already installed part
    Update(PartArgs),
}

#[derive(Args)]
struct PartArgs {
    #[clap(default_value = "buildout.toml", long, short)]
    config: PathBuf,

    /// Part section to use; may be omitted when the config has only one
    #[clap(long, short)]
    part: Option<String>,

    /// Option override, e.g. --option cookie=secret
    #[clap(long = "option", short = 'o', value_parser = parse_option)]
    options: Vec<(String, String)>,

    /// Print the returned paths as a JSON array
    #[clap(long)]
    json: bool,
}

fn parse_option(value: &str) -> Result<(String, String)> {
    let (key, value) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{value}'"))?;

    Ok((key.trim().to_string(), value.to_string()))
}

async fn load(args: &PartArgs) -> Result<RabbitMq> {
    let part = config::load(&args.config, args.part.as_deref(), &args.options)
        .await
        .with_context(|| format!("failed to load part from {:?}", args.config))?;

    Ok(RabbitMq::new(part))
}

fn print_paths(paths: &[PathBuf], json: bool) -> Result<()> {
    if json {
        let paths = paths.iter().map(|path| path.display().to_string()).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    for path in paths {
        println!("{}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(cli.level)
        .with_writer(std::io::stderr);

    // when we run the command with `TRACE` or `DEBUG` level, we want to see
    // the file and line number...
    if [Level::DEBUG, Level::TRACE].contains(&cli.level) {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    let subscriber = subscriber.finish();

    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")?;

    match &cli.command {
        Command::Install(args) => {
            let recipe = load(args).await?;
            let paths = recipe
                .install()
                .await
                .with_context(|| format!("failed to install part '{}'", recipe.part().name))?;
            print_paths(&paths, args.json)
        }
        Command::Update(args) => {
            let recipe = load(args).await?;
            let paths = recipe
                .update()
                .await
                .with_context(|| format!("failed to update part '{}'", recipe.part().name))?;
            print_paths(&paths, args.json)
        }
    }
}

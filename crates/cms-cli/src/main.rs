use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use cms_cli::{logging, scenario};
use cms_core::{Cms, CmsConfig};
use std::path::PathBuf;

fn load_config(file: Option<&PathBuf>) -> anyhow::Result<CmsConfig> {
    let config = match file {
        Some(path) => CmsConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CmsConfig::new(),
    };
    Ok(config.with_env()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_arg = Arg::new("config")
        .long("config")
        .global(true)
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");

    let cli = Command::new("cms")
        .version(cms_cli::VERSION)
        .about("Hierarchical CMS tree services")
        .subcommand_required(true)
        .arg(config_arg)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("scenario")
                .about("Create a menu, reorder it and print the fetched tree")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"));

    let matches = cli.get_matches();
    logging::init("info", matches.get_flag("log-json"))?;
    let config = load_config(matches.get_one::<PathBuf>("config"))?;
    tracing::debug!(?config, "configuration loaded");

    match matches.subcommand() {
        Some(("scenario", args)) => {
            let cms = Cms::in_memory(config);
            let report = scenario::run(&cms).await?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Created:");
                print!("{}", scenario::render(&report.created));
                println!("Fetched after update:");
                print!("{}", scenario::render(&report.fetched));
            }
        }
        Some(("config", _)) => {
            println!("cache_ttl_secs = {}", config.cache_ttl_secs);
            println!("cache_capacity = {}", config.cache_capacity);
            println!("max_tree_depth = {}", config.max_tree_depth);
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

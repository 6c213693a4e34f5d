//! Config command - configuration inspection.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use larder_config::LarderConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Defaults to `show`
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration, defaults filled in
    Show,

    /// Show which config files were checked and which were loaded
    Which,

    /// Write a config file populated with defaults
    Init {
        /// Create project-local config (./larder.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force),
    }
}

/// Every section present, with defaults where the files were silent.
fn effective(config: &LarderConfig) -> LarderConfig {
    LarderConfig {
        cache: Some(config.cache()),
        session: Some(config.session()),
        logging: Some(config.logging()),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = effective(&ctx.config);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("# Larder Configuration\n");
    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    if ctx.json_output {
        let sources: Vec<_> = ctx
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if ctx.sources.is_empty() {
        println!("No config locations checked");
    }
    for source in &ctx.sources {
        let marker = if source.loaded { "loaded " } else { "missing" };
        println!("{marker}  {}", source.path.display());
    }
    Ok(())
}

fn cmd_init(local: bool, force: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("larder.toml")
    } else {
        match larder_config::xdg_config_path() {
            Some(path) => path,
            None => bail!("could not determine the user config directory; use --local"),
        }
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    larder_config::save_config(&effective(&LarderConfig::default()), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

use std::io;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;

use vmnoop::cli::{self, Commands};
use vmnoop::plugin::default_registry;
use vmnoop::registry::DuplicatePolicy;

fn main() -> Result<()> {
    let args = cli::parse_args()?;

    vmnoop::init_logging(args.command.log_level())?;

    match &args.command {
        Commands::List(_) => {
            let registry =
                default_registry(DuplicatePolicy::Reject).context("failed to initialize registry")?;
            vmnoop::run_list(&registry, &mut io::stdout().lock())?;
        }
        Commands::Validate(opts) => vmnoop::run_validate(opts)?,
        Commands::Check(opts) => {
            vmnoop::run_check(opts)?;
        }
        Commands::Invoke(opts) => {
            let registry =
                default_registry(DuplicatePolicy::Reject).context("failed to initialize registry")?;
            vmnoop::run_invoke(opts, &registry)?;
        }
        Commands::Completions(opts) => {
            let mut cmd = cli::Cli::command();
            let name = cmd.get_name().to_string();
            generate(opts.shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

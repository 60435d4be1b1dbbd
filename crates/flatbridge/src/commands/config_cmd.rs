//! Config subcommand handlers.

use flatbridge_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = config::config_path();
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = config::load_config(global.config.as_deref())?;
            let toml = cfg.to_toml()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| toml.trim_end().to_owned(),
                |c: &Config| {
                    c.tree
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

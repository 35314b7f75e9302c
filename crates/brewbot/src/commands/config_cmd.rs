//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

fn render_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# failed to render config: {e}"))
}

fn validate_url(input: &str) -> Result<(), String> {
    match url::Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("expected http or https, got '{}'", url.scheme())),
        Err(e) => Err(format!("invalid URL: {e}")),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = output::render_single(&global.output, &cfg, render_toml, |c| {
                c.controller.url.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => init(global),
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path();
    if path.exists()
        && !util::confirm(
            &format!("Overwrite existing config at {}?", path.display()),
            global.yes,
        )?
    {
        return Ok(());
    }

    let mut cfg = config::load(global).unwrap_or_default();

    if global.yes {
        // Non-interactive: write the resolved values as they are.
        let written = config::save_config(&cfg)?;
        eprintln!("Config written to {}", written.display());
        return Ok(());
    }
    util::require_terminal("config init")?;

    eprintln!("brewbot configuration");
    eprintln!("   Config path: {}\n", path.display());

    cfg.controller.url = Input::new()
        .with_prompt("Controller URL")
        .default(cfg.controller.url.clone())
        .validate_with(|input: &String| validate_url(input))
        .interact_text()
        .map_err(util::prompt_err)?;

    cfg.defaults.timeout = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(cfg.defaults.timeout)
        .validate_with(|secs: &u64| {
            if *secs == 0 {
                Err("must be at least 1 second")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(util::prompt_err)?;

    cfg.simulator.require_cups = Confirm::new()
        .with_prompt("Should the simulator require cups under the grinder and dispenser?")
        .default(cfg.simulator.require_cups)
        .interact()
        .map_err(util::prompt_err)?;

    let written = config::save_config(&cfg)?;
    eprintln!("\n   ✓ Config written to {}", written.display());
    Ok(())
}

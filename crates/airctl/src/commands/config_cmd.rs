//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use airctl_core::config::DEFAULT_PORT;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn render_config(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Render(e.to_string()))
}

fn profile_listing(cfg: &Config) -> String {
    cfg.profiles
        .iter()
        .map(|(name, profile)| {
            let marker = if cfg.default_profile.as_deref() == Some(name.as_str()) {
                "*"
            } else {
                " "
            };
            let port = profile.port.unwrap_or(cfg.defaults.port);
            format!("{marker} {name}\t{}:{port}", profile.host)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn set_default(cfg: &mut Config, name: &str) -> Result<(), CliError> {
    if !cfg.profiles.contains_key(name) {
        return Err(CliError::ProfileNotFound {
            name: name.into(),
            available: cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
        });
    }
    cfg.default_profile = Some(name.into());
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("airctl configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config()?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()?;

            let host: String = Input::new()
                .with_prompt("Purifier (or bridge) host")
                .interact_text()?;
            if host.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "host".into(),
                    reason: "host cannot be empty".into(),
                });
            }

            let port: u16 = Input::new()
                .with_prompt("Port")
                .default(DEFAULT_PORT)
                .interact_text()?;

            let make_default = cfg.profiles.is_empty()
                || Confirm::new()
                    .with_prompt(format!("Make '{profile_name}' the default profile?"))
                    .default(true)
                    .interact()?;

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    host: host.trim().to_owned(),
                    port: (port != DEFAULT_PORT).then_some(port),
                    ..Profile::default()
                },
            );
            if make_default {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            eprintln!("\n   Profile '{profile_name}' saved to {}", path.display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&render_config(&cfg)?, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Create one with: airctl config init");
            } else {
                output::print_output(&profile_listing(&cfg), global.quiet);
            }
            Ok(())
        }

        // ── Use: switch default profile ─────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            set_default(&mut cfg, &name)?;
            config::save_config(&cfg)?;
            output::print_output(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}

//! `gotcha config` subcommands.

use std::error::Error;

use clap::Subcommand;

use crate::core::config::data::{path_display, Config};
use crate::core::config::keys::SettingError;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the path of the configuration file
    Path,
}

pub fn run_config(action: Option<ConfigAction>) -> Result<(), Box<dyn Error>> {
    match action {
        None => {
            let config = Config::load()?;
            config.print_all();
        }
        Some(ConfigAction::Path) => println!("{}", path_display(Config::config_path()?)),
        Some(ConfigAction::Set { key, value }) => {
            let value = value.join(" ");
            if let Err(err) = update_config(|config| config.set_value(&key, &value)) {
                err.print();
                std::process::exit(1);
            }
            println!("✅ Set {key} to: {value}");
        }
        Some(ConfigAction::Unset { key }) => {
            if let Err(err) = update_config(|config| config.unset_value(&key)) {
                err.print();
                std::process::exit(1);
            }
            println!("✅ Unset {key}");
        }
    }
    Ok(())
}

fn update_config<F>(change: F) -> Result<(), SettingError>
where
    F: FnOnce(&mut Config) -> Result<(), SettingError>,
{
    let mut config = Config::load().map_err(|err| SettingError::ConfigError(err.to_string()))?;
    change(&mut config)?;
    config
        .save()
        .map_err(|err| SettingError::ConfigError(err.to_string()))
}

//! Config command: show configuration and its location.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;

pub fn run_config(action: &ConfigAction, settings: Settings) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)?;
            Output::header("Current Configuration");
            println!("{}", content);
        }
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
        }
    }
    Ok(())
}

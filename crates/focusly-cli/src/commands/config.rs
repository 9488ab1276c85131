use clap::Subcommand;
use focusly_core::{Settings, SettingsStore};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "timer.work_duration_secs", "sound.volume")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List {
        /// Print the whole file as JSON instead of key=value lines
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            match settings.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut store = SettingsStore::load()?;
            match store.set(&key, &value)? {
                Some(change) => println!(
                    "{}: {} -> {}",
                    change.key,
                    change.old.unwrap_or_default(),
                    change.new.unwrap_or_default()
                ),
                None => println!("{key} unchanged"),
            }
        }
        ConfigAction::List { json } => {
            let settings = Settings::load()?;
            if json {
                print_json(&settings)?;
            } else {
                for (key, value) in settings.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            let mut store = SettingsStore::load()?;
            let changes = store.reset()?;
            println!("config reset to defaults ({} values changed)", changes.len());
        }
        ConfigAction::Path => {
            println!("{}", Settings::path()?.display());
        }
    }
    Ok(())
}

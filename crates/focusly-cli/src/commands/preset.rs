use clap::Subcommand;
use focusly_core::{PresetManager, SettingsStore, TimerPreset};

use super::{open_db, print_json, CmdResult};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and custom presets
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the active preset
    Current,
    /// Activate a preset and copy its durations into the timer settings
    Use {
        /// Preset name or id
        preset: String,
    },
    /// Create a custom preset
    Add {
        name: String,
        /// Work minutes
        #[arg(long)]
        work: u64,
        /// Break minutes
        #[arg(long = "break")]
        brk: u64,
        /// Long break minutes, taken every --cycles breaks
        #[arg(long)]
        long_break: Option<u64>,
        #[arg(long, default_value = "4")]
        cycles: u32,
    },
    /// Delete a custom preset
    Delete {
        /// Preset name or id
        preset: String,
    },
}

pub(super) fn find<'a>(presets: &'a PresetManager, needle: &str) -> Result<&'a TimerPreset, String> {
    needle
        .parse()
        .ok()
        .and_then(|id| presets.find(id))
        .or_else(|| presets.find_by_name(needle))
        .ok_or_else(|| format!("no preset named '{needle}'"))
}

fn print_preset(preset: &TimerPreset, current: bool) {
    let marker = if current { "*" } else { " " };
    let kind = if preset.is_built_in { "" } else { " (custom)" };
    println!("{marker} {:<18} {}{kind}", preset.name, preset.description());
}

pub fn run(action: PresetAction) -> CmdResult {
    let mut presets = PresetManager::load(open_db()?)?;

    match action {
        PresetAction::List { json } => {
            if json {
                print_json(presets.presets())?;
            } else {
                let current = presets.current().id;
                for preset in presets.presets() {
                    print_preset(preset, preset.id == current);
                }
            }
        }
        PresetAction::Current => print_preset(presets.current(), true),
        PresetAction::Use { preset } => {
            let id = find(&presets, &preset)?.id;
            let selected = presets.set_current(id)?.clone();
            let mut settings = SettingsStore::load()?;
            let changes = settings.apply_preset(&selected)?;
            println!("using {} ({} settings changed)", selected.name, changes.len());
        }
        PresetAction::Add {
            name,
            work,
            brk,
            long_break,
            cycles,
        } => {
            let preset = TimerPreset::custom(name, work * 60, brk * 60, long_break.map(|m| m * 60), cycles);
            let id = preset.id;
            presets.add(preset)?;
            println!("added {id}");
        }
        PresetAction::Delete { preset } => {
            let id = find(&presets, &preset)?.id;
            let removed = presets.delete(id)?;
            println!("deleted {}", removed.name);
        }
    }
    Ok(())
}

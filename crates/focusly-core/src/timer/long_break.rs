//! Break length selection at the end of a work phase.
//!
//! The active preset defines the long-break cadence; the settings' cycle
//! count decides where the session ends. The final work phase never earns a
//! long break because it completes the session instead.

use super::session::TimerConfiguration;
use crate::presets::TimerPreset;

/// Outcome of [`select_break`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakSelection {
    pub duration_secs: u64,
    pub long_break: bool,
}

/// Pick the break that follows the work phase which brought the timer to
/// `next_cycle`.
///
/// NOTE: cadence comes from `preset.max_cycles` while the end-of-session
/// gate uses `config.max_cycles`. The two diverge when settings are edited
/// after a preset was applied; both are honoured as they stand.
pub fn select_break(
    next_cycle: u32,
    config: &TimerConfiguration,
    preset: Option<&TimerPreset>,
) -> BreakSelection {
    let regular = BreakSelection {
        duration_secs: config.break_duration_secs,
        long_break: false,
    };

    let Some(preset) = preset else {
        return regular;
    };
    if preset.max_cycles == 0 {
        return regular;
    }

    let at_cadence = next_cycle % preset.max_cycles == 0;
    let before_final = next_cycle < config.max_cycles;
    match preset.long_break_duration_secs {
        Some(long) if at_cadence && before_final => BreakSelection {
            duration_secs: long,
            long_break: true,
        },
        _ => regular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(max_cycles: u32) -> TimerConfiguration {
        TimerConfiguration {
            work_duration_secs: 1500,
            break_duration_secs: 300,
            max_cycles,
        }
    }

    fn preset(cadence: u32, long: Option<u64>) -> TimerPreset {
        TimerPreset::custom("Test", 1500, 300, long, cadence)
    }

    #[test]
    fn long_break_at_cadence_but_not_on_final_cycle() {
        let cfg = config(6);
        let p = preset(2, Some(900));
        assert_eq!(select_break(1, &cfg, Some(&p)).duration_secs, 300);
        assert_eq!(select_break(2, &cfg, Some(&p)).duration_secs, 900);
        assert_eq!(select_break(3, &cfg, Some(&p)).duration_secs, 300);
        assert_eq!(select_break(4, &cfg, Some(&p)).duration_secs, 900);
        let last = select_break(6, &cfg, Some(&p));
        assert_eq!(last.duration_secs, 300);
        assert!(!last.long_break);
    }

    #[test]
    fn preset_without_long_break_uses_regular_break() {
        let selection = select_break(2, &config(6), Some(&preset(2, None)));
        assert_eq!(selection.duration_secs, 300);
        assert!(!selection.long_break);
    }

    #[test]
    fn no_preset_uses_regular_break() {
        assert_eq!(select_break(4, &config(8), None).duration_secs, 300);
    }

    #[test]
    fn zero_cadence_never_yields_long_break() {
        let selection = select_break(3, &config(6), Some(&preset(0, Some(900))));
        assert!(!selection.long_break);
    }

    proptest! {
        #[test]
        fn long_break_only_at_cadence_points(
            next_cycle in 1u32..64,
            cadence in 1u32..10,
            max_cycles in 1u32..64,
        ) {
            let cfg = config(max_cycles);
            let p = preset(cadence, Some(1200));
            let selection = select_break(next_cycle, &cfg, Some(&p));
            let expected = next_cycle % cadence == 0 && next_cycle < max_cycles;
            prop_assert_eq!(selection.long_break, expected);
            prop_assert_eq!(selection.duration_secs, if expected { 1200 } else { 300 });
        }
    }
}

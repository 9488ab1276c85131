use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerPhase;

/// Every state change of the timer produces an Event.
/// The CLI prints them; overlay or activity layers react to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        remaining_secs: u64,
        current_cycle: u32,
        at: DateTime<Utc>,
    },
    TimerStopped {
        /// Phase the timer was in when stopped.
        from: TimerPhase,
        at: DateTime<Utc>,
    },
    BreakStarted {
        cycle: u32,
        duration_secs: u64,
        long_break: bool,
        at: DateTime<Utc>,
    },
    BreakEnded {
        cycle: u32,
        at: DateTime<Utc>,
    },
    BreakSkipped {
        cycle: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        cycles_completed: u32,
        work_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        remaining_secs: u64,
        current_cycle: u32,
        max_cycles: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerStopped { at, .. }
            | Event::BreakStarted { at, .. }
            | Event::BreakEnded { at, .. }
            | Event::BreakSkipped { at, .. }
            | Event::SessionCompleted { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::BreakStarted {
            cycle: 2,
            duration_secs: 900,
            long_break: true,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "break_started");
        assert_eq!(json["duration_secs"], 900);
    }
}

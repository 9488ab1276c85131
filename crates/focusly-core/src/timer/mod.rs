mod engine;
mod long_break;
mod session;

pub use engine::TimerManager;
pub use long_break::{select_break, BreakSelection};
pub use session::{TimerConfiguration, TimerPhase, TimerSession};

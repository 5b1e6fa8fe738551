//! Console operator
//!
//! Pauses print the message and wait for Enter on stdin. In unattended
//! mode (simulations, CI) a pause is logged and the run continues at once.

use shared::{station_info, station_warn, StationId};
use std::io::{BufRead, Write};

use crate::error::StationResult;
use crate::traits::Operator;

pub struct ConsoleOperator {
    interactive: bool,
    pauses: u32,
}

impl ConsoleOperator {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            pauses: 0,
        }
    }

    pub fn unattended() -> Self {
        Self {
            interactive: false,
            pauses: 0,
        }
    }

    /// Number of pauses requested so far
    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}

impl Operator for ConsoleOperator {
    fn pause(&mut self, message: &str) -> StationResult<()> {
        self.pauses += 1;
        station_warn!(StationId::current(), "⏸️  Paused: {}", message);
        if !self.interactive {
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        write!(stdout, "{message} Press Enter to resume... ")?;
        stdout.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        station_info!(StationId::current(), "▶️  Resumed");
        Ok(())
    }

    fn comment(&mut self, message: &str) {
        station_info!(StationId::current(), "💬 {}", message);
    }
}

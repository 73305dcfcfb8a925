//! Operator-facing audible signal
//!
//! An optional side channel next to the websocket push: ring the terminal
//! bell when appointments turn up, so an operator watching a shell hears
//! about availability without staring at logs. Purely best-effort and
//! orthogonal to snapshot data.

use std::io::Write;

/// Terminal-bell signal honoring the quiet flag
#[derive(Debug, Clone)]
pub struct Signal {
    quiet: bool,
}

impl Signal {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Appointments were found this cycle.
    pub fn found(&self) {
        self.ring(1);
    }

    /// The cycle failed. Two bells, so the sound is distinguishable.
    pub fn failed(&self) {
        self.ring(2);
    }

    fn ring(&self, count: usize) {
        if self.quiet {
            return;
        }

        // BEL to stderr keeps the signal working over plain ssh sessions.
        let mut stderr = std::io::stderr();
        for _ in 0..count {
            let _ = stderr.write_all(b"\x07");
        }
        let _ = stderr.flush();
    }
}

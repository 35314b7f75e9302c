// Cosmetic progress for the working phases. It does not track the
// machine; it only gives the user something that moves.

use crate::config::ProgressConfig;

/// A percentage that climbs by a fixed step per tick up to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    value: u8,
    config: ProgressConfig,
}

impl Progress {
    pub fn new(config: ProgressConfig) -> Self {
        Self { value: 0, config }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Advance one tick and return the new value.
    pub fn tick(&mut self) -> u8 {
        let cap = self.config.cap.min(100);
        self.value = self.value.saturating_add(self.config.step).min(cap);
        self.value
    }

    /// Jump to 100 once the work is really finished.
    pub fn complete(&mut self) {
        self.value = 100;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn climbs_by_step_and_stops_at_cap() {
        let mut progress = Progress::new(ProgressConfig::default());
        assert_eq!(progress.tick(), 3);
        assert_eq!(progress.tick(), 6);

        for _ in 0..100 {
            progress.tick();
        }
        assert_eq!(progress.value(), 95);

        progress.reset();
        assert_eq!(progress.value(), 0);
    }

    #[test]
    fn cap_never_exceeds_one_hundred() {
        let mut progress = Progress::new(ProgressConfig {
            step: 250,
            cap: 200,
            ..ProgressConfig::default()
        });
        assert_eq!(progress.tick(), 100);
    }
}

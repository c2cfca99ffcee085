use jiff::SignedDuration;
use serde::Serialize;

/// Ready and due offsets measured from the start of the planning horizon.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    ready: SignedDuration,
    due: SignedDuration,
}

impl TimeWindow {
    pub fn new(ready: SignedDuration, due: SignedDuration) -> Self {
        TimeWindow { ready, due }
    }

    pub fn ready(&self) -> SignedDuration {
        self.ready
    }

    pub fn due(&self) -> SignedDuration {
        self.due
    }

    /// Lowers the due time to `maximum_due` when it is later.
    ///
    /// Returns the correction that was applied, if any.
    pub fn clamp_due(&mut self, maximum_due: SignedDuration) -> Option<DueTimeCorrection> {
        if self.due <= maximum_due {
            return None;
        }

        let correction = DueTimeCorrection {
            original: self.due,
            corrected: maximum_due,
        };
        self.due = maximum_due;

        Some(correction)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimeCorrection {
    pub original: SignedDuration,
    pub corrected: SignedDuration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_due_lowers_late_due_time() {
        let mut window = TimeWindow::new(SignedDuration::ZERO, SignedDuration::from_secs(100));
        let correction = window.clamp_due(SignedDuration::from_secs(80));

        assert_eq!(window.due(), SignedDuration::from_secs(80));
        assert_eq!(
            correction,
            Some(DueTimeCorrection {
                original: SignedDuration::from_secs(100),
                corrected: SignedDuration::from_secs(80),
            })
        );
    }

    #[test]
    fn test_clamp_due_keeps_early_due_time() {
        let mut window = TimeWindow::new(SignedDuration::ZERO, SignedDuration::from_secs(50));

        assert_eq!(window.clamp_due(SignedDuration::from_secs(80)), None);
        assert_eq!(window.due(), SignedDuration::from_secs(50));
    }
}

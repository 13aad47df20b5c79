// ============================================================
// Layer 5 - One-Cycle Learning Rate Schedule
// ============================================================
// Two cosine phases over the whole run:
//
//   lr
//   ▲        lr_max
//   │        ╭──╮
//   │      ╭╯    ╰╮
//   │    ╭╯        ╰──╮
//   │ ──╯              ╰────── lr_max / div_final
//   │ lr_max / div
//   └──────────────────────────► step
//     |<- pct_start ->|
//
// Warm-up from lr_max/div to lr_max over the first pct_start of
// the steps, then anneal to lr_max/div_final.
//
// Reference: Smith & Topin (2017) "Super-Convergence"

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneCycleSchedule {
    pub lr_max:      f64,
    pub total_steps: usize,
    pub pct_start:   f64,
    pub div:         f64,
    pub div_final:   f64,
}

impl OneCycleSchedule {
    pub fn new(lr_max: f64, total_steps: usize) -> Self {
        Self { lr_max, total_steps, pct_start: 0.25, div: 25.0, div_final: 1e5 }
    }

    /// Learning rate before optimiser step `step` (0-based).
    pub fn lr_at(&self, step: usize) -> f64 {
        let pos = if self.total_steps == 0 {
            0.0
        } else {
            (step as f64 / self.total_steps as f64).min(1.0)
        };

        let start = self.lr_max / self.div;
        let end   = self.lr_max / self.div_final;

        if pos < self.pct_start {
            cos_anneal(start, self.lr_max, pos / self.pct_start)
        } else {
            cos_anneal(self.lr_max, end, (pos - self.pct_start) / (1.0 - self.pct_start))
        }
    }
}

/// Cosine interpolation from `start` (pct = 0) to `end` (pct = 1).
fn cos_anneal(start: f64, end: f64, pct: f64) -> f64 {
    start + (1.0 + (PI * (1.0 - pct)).cos()) * (end - start) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() <= 1e-12_f64.max(b.abs() * 1e-9) }

    #[test]
    fn test_starts_at_lr_over_div() {
        let s = OneCycleSchedule::new(3e-4, 100);
        assert!(close(s.lr_at(0), 3e-4 / 25.0));
    }

    #[test]
    fn test_peaks_at_pct_start() {
        let s = OneCycleSchedule::new(3e-4, 100);
        assert!(close(s.lr_at(25), 3e-4));
        assert!(s.lr_at(10) < s.lr_at(20));
        assert!(s.lr_at(60) > s.lr_at(90));
    }

    #[test]
    fn test_ends_near_lr_over_div_final() {
        let s = OneCycleSchedule::new(1e-2, 40);
        assert!(close(s.lr_at(40), 1e-2 / 1e5));
        assert!(s.lr_at(39) > s.lr_at(40));
    }

    #[test]
    fn test_never_exceeds_peak() {
        let s = OneCycleSchedule::new(1.0, 37);
        assert!((0..=37).all(|i| s.lr_at(i) <= 1.0 + 1e-12));
    }
}

//! Mapping of phase-local progress into a caller-assigned slice of `[0, 1]`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRange {
    lo: f64,
    hi: f64,
}

impl ProgressRange {
    pub const FULL: ProgressRange = ProgressRange { lo: 0.0, hi: 1.0 };

    /// Bounds are clamped into `[0, 1]` and reordered if inverted.
    pub fn new(lo: f64, hi: f64) -> Self {
        let lo = clamp_unit(lo);
        let hi = clamp_unit(hi);
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// `lo + (hi - lo) * p`, clamped to `[lo, hi]`.
    pub fn map(&self, p: f64) -> f64 {
        let p = clamp_unit(p);
        (self.lo + self.width() * p).clamp(self.lo, self.hi)
    }

    pub fn contains(&self, fraction: f64) -> bool {
        fraction >= self.lo && fraction <= self.hi
    }

    /// Split into consecutive sub-ranges proportional to `weights`.
    ///
    /// Non-positive weights get an empty slice. The last sub-range always ends
    /// exactly at `hi`.
    pub fn split(&self, weights: &[f64]) -> Vec<ProgressRange> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        let mut out = Vec::with_capacity(weights.len());
        let mut cursor = self.lo;
        for (i, w) in weights.iter().enumerate() {
            let end = if i + 1 == weights.len() {
                self.hi
            } else if total > 0.0 && *w > 0.0 {
                (cursor + self.width() * (w / total)).min(self.hi)
            } else {
                cursor
            };
            out.push(ProgressRange { lo: cursor, hi: end });
            cursor = end;
        }
        out
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

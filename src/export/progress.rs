//! Progress reporting for long-running exports
//!
//! Observers receive `(stage, percent)` updates. Within one export call the
//! percentages never go down, and a sub-operation can report its own 0..100
//! into a band of its parent's range.

use log::debug;

/// One progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    pub stage: String,
    /// 0.0 - 100.0
    pub progress: f32,
}

/// Anything that accepts progress updates.
pub trait Progress {
    fn report(&mut self, stage: &str, progress: f32);
}

/// Forwards updates to an observer, clamping them to be non-decreasing.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(&ExportProgress),
    last: f32,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a mut dyn FnMut(&ExportProgress)) -> Self {
        Self { sink, last: 0.0 }
    }

    /// Highest value emitted so far.
    pub fn last(&self) -> f32 {
        self.last
    }

    /// A child whose 0..100 maps onto `offset..offset + 100 * factor` here,
    /// with `prefix` prepended to every stage.
    pub fn rescaled<'r>(
        &'r mut self,
        offset: f32,
        factor: f32,
        prefix: &str,
    ) -> RescaledProgress<'r, 'a> {
        RescaledProgress {
            parent: self,
            offset,
            factor,
            prefix: prefix.to_string(),
        }
    }
}

impl Progress for ProgressReporter<'_> {
    fn report(&mut self, stage: &str, progress: f32) {
        let progress = if progress.is_finite() {
            progress.clamp(self.last, 100.0)
        } else {
            self.last
        };
        self.last = progress;
        debug!("Export progress {:>5.1}% {}", progress, stage);
        (self.sink)(&ExportProgress {
            stage: stage.to_string(),
            progress,
        });
    }
}

/// A band of a parent reporter, see [`ProgressReporter::rescaled`].
pub struct RescaledProgress<'r, 'a> {
    parent: &'r mut ProgressReporter<'a>,
    offset: f32,
    factor: f32,
    prefix: String,
}

impl Progress for RescaledProgress<'_, '_> {
    fn report(&mut self, stage: &str, progress: f32) {
        let stage = format!("{}{}", self.prefix, stage);
        let mapped = f64::from(self.offset) + f64::from(progress) * f64::from(self.factor);
        // Two decimals keep band edges exact (100 * 0.6 is 60, not 60.000004).
        let mapped = (mapped * 100.0).round() / 100.0;
        self.parent.report(&stage, mapped as f32);
    }
}

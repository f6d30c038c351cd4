//! Progress reporting shared by the index builder and every analyzer pass.

/// Wraps the host's `(fraction, status)` callback
///
/// The callback is synchronous and only informative; nothing in the analysis
/// depends on what it does.
pub struct Progress<'a> {
    callback: Box<dyn FnMut(f32, &str) + 'a>,
}

impl<'a> Progress<'a> {
    /// Number of items between two reports inside a loop
    pub const INTERVAL: usize = 10;

    pub fn new(callback: impl FnMut(f32, &str) + 'a) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A progress sink that drops every report
    pub fn silent() -> Self {
        Self::new(|_, _| {})
    }

    /// Report unconditionally, clamping the fraction into `[0, 1]`
    pub fn report(&mut self, fraction: f32, status: &str) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        (self.callback)(fraction, status);
    }

    /// Report for item `index` of `total`, only every few items
    pub fn tick(&mut self, index: usize, total: usize, status: impl FnOnce() -> String) {
        if total == 0 {
            return;
        }
        if index % Self::INTERVAL == 0 || index + 1 == total {
            let fraction = index as f32 / total as f32;
            self.report(fraction, &status());
        }
    }

    pub fn finish(&mut self, status: &str) {
        self.report(1.0, status);
    }
}

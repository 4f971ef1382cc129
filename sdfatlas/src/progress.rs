use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

/// How a rasterization pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassEnd {
    Completed,
    /// Stopped at the first failing glyph; later glyphs never report.
    Aborted,
}

/// Observer of the glyph rasterization pass.
///
/// `finish` is called exactly once after `begin`, also when a glyph fails.
pub trait GlyphProgress: Send + Sync {
    fn begin(&self, total: usize);

    /// `ch` is the glyph just collected; `done` counts collected glyphs in
    /// charset order.
    fn glyph_done(&self, ch: char, done: usize);

    fn finish(&self, end: PassEnd);
}

/// Reports nothing beyond debug logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietProgress;

impl GlyphProgress for QuietProgress {
    fn begin(&self, total: usize) {
        debug!(total, "rasterizing glyphs");
    }

    fn glyph_done(&self, _ch: char, _done: usize) {}

    fn finish(&self, end: PassEnd) {
        debug!(?end, "rasterization pass ended");
    }
}

/// Terminal progress bar naming the last glyph collected.
pub struct GlyphBar {
    bar: ProgressBar,
}

impl GlyphBar {
    pub fn stderr() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    pub fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        if let Ok(style) =
            ProgressStyle::with_template("{prefix} {msg:>6} [{bar:40}] {pos}/{len} ({elapsed})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix("rasterizing");
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl GlyphProgress for GlyphBar {
    fn begin(&self, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
    }

    fn glyph_done(&self, ch: char, done: usize) {
        self.bar.set_message(glyph_label(ch));
        self.bar.set_position(done as u64);
    }

    fn finish(&self, end: PassEnd) {
        // cleared either way so an error report starts on a clean line
        self.bar.finish_and_clear();
        if end == PassEnd::Aborted {
            debug!(collected = self.bar.position(), "rasterization pass aborted");
        }
    }
}

/// Printable label for a glyph; whitespace and invisible characters show
/// their code point instead.
fn glyph_label(ch: char) -> String {
    if ch.is_whitespace() || ch.is_control() {
        format!("U+{:04X}", ch as u32)
    } else {
        ch.to_string()
    }
}

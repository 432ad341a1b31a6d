//! Progress bars for the iterative solvers.
//!
//! Bars are hidden unless a binary switches them on, so library users and
//! tests see no terminal output.

use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

static ENABLED: AtomicBool = AtomicBool::new(false);

pub fn enable(on: bool) { ENABLED.store(on, Ordering::Relaxed) }

pub fn bar(len: u64, message: &'static str) -> ProgressBar {
    if !ENABLED.load(Ordering::Relaxed) { return ProgressBar::hidden() }
    let style = ProgressStyle::default_bar()
        .template("{msg:>8} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    let bar = ProgressBar::new(len).with_message(message);
    bar.set_style(style);
    bar.tick();
    bar
}

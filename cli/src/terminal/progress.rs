use std::sync::Arc;

use colored::*;
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use subscratch_core::engine::ProgressFn;

const TEMPLATE: &str = "{spinner:.blue} {msg} [{bar:30.green/bright_black}] {pos}/{len} ({per_sec})";

/// Span whose progress bar tracks probed candidates.
pub fn enumeration_span(total: usize) -> Span {
    let span: Span = info_span!("enumerate", indicatif.pb_show = true);

    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        span.pb_set_style(&style.tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]));
    }
    span.pb_set_length(total as u64);
    span.pb_set_message(&format!("{}", "Probing".bold()));
    span
}

/// Engine callback moving the bar of `span`.
pub fn reporter(span: &Span) -> ProgressFn {
    let span: Span = span.clone();
    Arc::new(move |probed: usize| span.pb_set_position(probed as u64))
}

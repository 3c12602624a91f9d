//! Plain-text listing of a composed soundtrack

use std::fmt::Write;

use crate::model::{Playable, Route};

const TITLE_WIDTH: usize = 40;
const SUBTITLE_WIDTH: usize = 30;

pub const GUIDANCE_HINT: &str = "Turn-by-turn guidance is available for this journey";

pub fn header(route: &Route) -> String {
    format!("Music for your {} minute journey", route.duration_mins())
}

/// Header, one numbered line per playable, then the guidance hint when the
/// route is a single walk or drive
pub fn render_soundtrack(route: &Route, playables: &[Playable]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(route));
    let _ = writeln!(out);

    if playables.is_empty() {
        let _ = writeln!(out, " Nothing to play");
    }

    let num_width = index_width(playables.len());
    for (i, playable) in playables.iter().enumerate() {
        let _ = writeln!(
            out,
            " {:>num_width$}   {}   {}   {:>4} mins   {}",
            i + 1,
            fit_column(&playable.title, TITLE_WIDTH),
            fit_column(&playable.subtitle, SUBTITLE_WIDTH),
            playable.duration_mins,
            playable.uri,
            num_width = num_width,
        );
    }

    if route.supports_guided_navigation() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", GUIDANCE_HINT);
    }

    out
}

/// Index column: digits of the last number plus a space
fn index_width(count: usize) -> usize {
    count.max(1).to_string().len() + 1
}

/// Pads `text` to `width` characters, cutting it short with an ellipsis
fn fit_column(text: &str, width: usize) -> String {
    let mut chars = text.chars();
    let mut shown: String = chars.by_ref().take(width).collect();
    if chars.next().is_some() {
        shown = shown.chars().take(width.saturating_sub(1)).collect();
        shown.push('…');
    }
    format!("{:<width$}", shown)
}

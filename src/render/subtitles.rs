use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::error::StoryreelResult,
    preset::catalog::SubtitleStyle,
    project::model::SubtitleItem,
};

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_srt_time(secs: f64) -> String {
    let ms = (secs.max(0.0) * 1000.0).round() as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Serialize caption items as SRT. Empty-window items are dropped.
pub fn write_srt(items: &[SubtitleItem]) -> String {
    let mut output = String::new();
    let visible = items.iter().filter(|i| i.end > i.start);
    for (n, item) in visible.enumerate() {
        if n > 0 {
            output.push('\n');
        }
        output.push_str(&format!("{}\n", n + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(item.start),
            format_srt_time(item.end)
        ));
        output.push_str(item.text.trim());
        output.push('\n');
    }
    output
}

/// Write `items` to `path` as SRT.
pub fn save_srt(items: &[SubtitleItem], path: &Path) -> StoryreelResult<()> {
    std::fs::write(path, write_srt(items))
        .with_context(|| format!("write subtitles '{}'", path.display()))?;
    Ok(())
}

/// Escape a value for use inside a filter-graph option.
pub fn escape_filter_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `subtitles` filter burning the SRT file at `srt` with `style`.
pub fn burn_filter(srt: &Path, style: &SubtitleStyle) -> StoryreelResult<String> {
    Ok(format!(
        "subtitles=filename={}:force_style='{}'",
        escape_filter_value(&srt.to_string_lossy()),
        style.to_force_style()?
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/subtitles.rs"]
mod tests;

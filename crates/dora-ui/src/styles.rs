//! Ayu Dark palette and render helpers for metric output.
//!
//! Color source: <https://github.com/ayu-theme/ayu-colors>
//!
//! Only values that call for attention get color: trends are green when they
//! move the right way and red otherwise, change failure rates are colored by
//! band. Everything else is plain text.

use owo_colors::OwoColorize;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff

pub const ICON_UP: &str = "\u{25B2}";
pub const ICON_DOWN: &str = "\u{25BC}";
pub const ICON_FLAT: &str = "\u{25AC}";
pub const ICON_PASS: &str = "\u{2713}";
pub const ICON_FAIL: &str = "\u{2716}";

const BAR_FULL: char = '\u{2588}';

pub const SEPARATOR_LIGHT: &str = "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}";

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Semantic helpers
// ---------------------------------------------------------------------------

pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Section header: uppercase, accent, bold.
pub fn render_category(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

pub fn render_separator() -> String {
    render_muted(SEPARATOR_LIGHT)
}

// ---------------------------------------------------------------------------
// Metric rendering
// ---------------------------------------------------------------------------

/// Which direction of change is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Better {
    Higher,
    Lower,
}

/// Formats a percentage change with an arrow, e.g. `▲ +50.0%`.
pub fn format_trend(change: f64) -> String {
    let icon = if change > 0.0 {
        ICON_UP
    } else if change < 0.0 {
        ICON_DOWN
    } else {
        ICON_FLAT
    };
    format!("{icon} {change:+.1}%")
}

/// Formats and colors a trend. A zero change stays muted.
pub fn render_trend(change: f64, better: Better) -> String {
    let text = format_trend(change);
    if change == 0.0 {
        return render_muted(&text);
    }
    let improved = match better {
        Better::Higher => change > 0.0,
        Better::Lower => change < 0.0,
    };
    if improved {
        render_pass(&text)
    } else {
        render_fail(&text)
    }
}

/// Colors a change failure rate percentage: up to 15% passes, up to 30%
/// warns, anything above fails.
pub fn render_failure_rate(rate: f64) -> String {
    let text = format!("{rate:.1}%");
    if rate <= 15.0 {
        render_pass(&text)
    } else if rate <= 30.0 {
        render_warn(&text)
    } else {
        render_fail(&text)
    }
}

/// Draws a bar of at most `width` cells for `value` relative to `max`.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max.is_nan() || max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max).min(1.0) * width as f64).round() as usize;
    std::iter::repeat_n(BAR_FULL, cells.max(1)).collect()
}

pub fn render_bar(value: f64, max: f64, width: usize) -> String {
    render_accent(&bar(value, max, width))
}

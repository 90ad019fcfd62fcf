//! Terminal styling for `dora` output: an Ayu-based palette, trend and
//! failure-rate coloring, and horizontal bars for chart views.

pub mod styles;
pub mod terminal;

//! Cluster boundaries and cell columns within one line of text.
//!
//! Character mode walks clusters; Column mode keeps a visual column when it
//! moves between lines, so wide and combining clusters must count right.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Start of the cluster after the one containing `byte`; the line end at or past it.
pub fn next_boundary(line: &str, byte: usize) -> usize {
    if byte >= line.len() {
        return line.len();
    }
    line.grapheme_indices(true)
        .map(|(idx, _)| idx)
        .find(|&idx| idx > byte)
        .unwrap_or(line.len())
}

/// Cells a cluster occupies. Zero-width clusters still take one.
pub fn cluster_width(g: &str) -> usize {
    g.width().max(1)
}

/// Cells before `byte`.
pub fn visual_col(line: &str, byte: usize) -> usize {
    line.grapheme_indices(true)
        .take_while(|(idx, _)| *idx < byte)
        .map(|(_, g)| cluster_width(g))
        .sum()
}

/// Byte offset of the cluster covering `target_col`, or the line end when the line is shorter.
pub fn byte_for_visual_col(line: &str, target_col: usize) -> usize {
    let mut col = 0;
    for (b, g) in line.grapheme_indices(true) {
        let w = cluster_width(g);
        if col + w > target_col {
            return b;
        }
        col += w;
    }
    line.len()
}

pub fn is_line_terminator(g: &str) -> bool {
    matches!(g, "\n" | "\r\n" | "\r")
}

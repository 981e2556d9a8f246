//! `progs.src` manifest parsing.
//!
//! The manifest defines the project's link order: `//` comments run to end of
//! line, remaining content splits on whitespace, and the first token is the
//! compiled output name rather than a source file. The rest are paths
//! relative to the manifest's directory.

use std::path::{Path, PathBuf};

/// Extract the link-ordered source paths from manifest text.
pub fn parse_source_order(manifest_dir: &Path, text: &str) -> Vec<PathBuf> {
    let stripped: Vec<&str> = text
        .lines()
        .map(|line| line.split("//").next().unwrap_or(""))
        .collect();

    stripped
        .join("\n")
        .split_whitespace()
        .skip(1)
        .map(|token| manifest_dir.join(token))
        .collect()
}

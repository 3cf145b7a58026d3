//! Class label files for ImageNet-style classifiers.
//!
//! One label per line, blank lines ignored. Lines in synset format
//! (`n01440764 tench, Tinca tinca`) have the WordNet id stripped so the
//! label reads `tench, Tinca tinca`.

use std::path::Path;

use anyhow::Context;

/// Parse label text into one label per class index.
pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| strip_wnid(l).to_string())
        .collect()
}

/// Load labels from a file.
pub fn load_labels(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading labels from {}", path.display()))?;
    let labels = parse_labels(&text);
    anyhow::ensure!(!labels.is_empty(), "no labels in {}", path.display());
    Ok(labels)
}

fn strip_wnid(line: &str) -> &str {
    let bytes = line.as_bytes();
    let is_wnid = bytes.len() > 10
        && bytes[0] == b'n'
        && bytes[1..9].iter().all(u8::is_ascii_digit)
        && bytes[9] == b' ';
    if is_wnid { line[10..].trim_start() } else { line }
}

//! Class label table for the model's output indices.

use std::path::Path;

use crate::error::PipelineError;

/// Labels indexed by model output position.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    names: Vec<String>,
}

impl Labels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse a label file: one label per line, blank lines skipped.
    ///
    /// A leading WordNet id (`n01440764 tench, Tinca tinca`) is stripped.
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(strip_wordnet_id)
            .map(str::to_string)
            .collect();
        Self { names }
    }

    /// Load labels from disk.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ModelLoad {
            path: path.to_path_buf(),
            message: format!("Cannot read labels: {e}"),
        })?;
        Ok(Self::parse(&content))
    }

    /// Label for class `idx`, or `class_{idx}` when the table is short.
    pub fn name(&self, idx: usize) -> String {
        self.names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("class_{idx}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn strip_wordnet_id(line: &str) -> &str {
    match line.split_once(' ') {
        Some((id, rest))
            if id.len() == 9
                && id.starts_with('n')
                && id[1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest.trim_start()
        }
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synset_lines() {
        let labels = Labels::parse("n01440764 tench, Tinca tinca\nn01443537 goldfish\n\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.name(0), "tench, Tinca tinca");
        assert_eq!(labels.name(1), "goldfish");
    }

    #[test]
    fn test_parse_plain_lines() {
        let labels = Labels::parse("background\ntench\nnumbfish, torpedo\n");
        assert_eq!(labels.name(0), "background");
        assert_eq!(labels.name(2), "numbfish, torpedo");
    }

    #[test]
    fn test_missing_index_falls_back() {
        let labels = Labels::default();
        assert!(labels.is_empty());
        assert_eq!(labels.name(7), "class_7");
    }
}

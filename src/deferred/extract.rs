//! Source block extraction.
//!
//! The body of a deferred block never runs, so its text is recovered from
//! the file it was written in: the file is re-read (honouring an encoding
//! marker in its first two lines), and the lines indented under the
//! `deferred:` marker are cut out and dedented.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use latebind_core::DeferredError;
use regex::Regex;

static ENCODING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"coding[:=]\s*([-\w.]+)").expect("encoding marker pattern is valid")
});

/// The dedented text of a deferred block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBlock {
    file: PathBuf,
    text: String,
    first_line: u32,
}

impl ExtractedBlock {
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The block body, one line per source line, common indentation removed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Absolute file line of the first body line.
    pub fn first_line(&self) -> u32 {
        self.first_line
    }

    /// Number of lines between block-relative and absolute line numbers.
    pub fn line_offset(&self) -> u32 {
        self.first_line.saturating_sub(1)
    }

    /// Absolute file line of block line `line` (1-indexed).
    pub fn absolute_line(&self, line: u32) -> u32 {
        line + self.line_offset()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Find the encoding named by a marker in the first two lines.
pub fn detect_encoding(bytes: &[u8]) -> Option<String> {
    bytes
        .split(|b| *b == b'\n')
        .take(2)
        .find_map(|line| {
            let line = String::from_utf8_lossy(line);
            ENCODING_MARKER
                .captures(&line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
}

/// Decode `bytes` from `encoding`.
pub fn decode(bytes: &[u8], encoding: &str, file: &Path) -> Result<String, DeferredError> {
    let decode_error = || DeferredError::Decode {
        file: file.to_path_buf(),
        encoding: encoding.to_string(),
    };

    match encoding.to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            String::from_utf8(bytes.to_vec()).map_err(|_| decode_error())
        }
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => {
            Ok(bytes.iter().map(|b| char::from(*b)).collect())
        }
        "ascii" | "us-ascii" => {
            if bytes.is_ascii() {
                Ok(bytes.iter().map(|b| char::from(*b)).collect())
            } else {
                Err(decode_error())
            }
        }
        _ => Err(DeferredError::UnsupportedEncoding {
            file: file.to_path_buf(),
            encoding: encoding.to_string(),
        }),
    }
}

/// Read a source file, honouring its encoding marker.
pub fn read_source(file: &Path, default_encoding: &str) -> Result<String, DeferredError> {
    let bytes = fs::read(file).map_err(|e| DeferredError::Io {
        file: file.to_path_buf(),
        message: e.to_string(),
    })?;
    let encoding = detect_encoding(&bytes).unwrap_or_else(|| default_encoding.to_string());
    decode(&bytes, &encoding, file)
}

/// Cut the body of the block opened on `marker_line` (1-indexed) out of
/// `source`.
///
/// Leading blank lines are skipped; the first non-blank line sets the
/// baseline indentation, which must be deeper than the marker's. The block
/// ends at the first non-blank line indented less than the baseline.
/// Blank lines inside the block are kept so line numbers stay aligned.
pub fn extract_block(source: &str, file: &Path, marker_line: u32) -> ExtractedBlock {
    let lines: Vec<&str> = source.lines().collect();
    let marker_indent = lines
        .get((marker_line as usize).saturating_sub(1))
        .map_or(0, |line| indent_of(line));

    let mut i = marker_line as usize;
    while i < lines.len() && is_blank(lines[i]) {
        i += 1;
    }
    let first_line = i as u32 + 1;

    let empty = ExtractedBlock {
        file: file.to_path_buf(),
        text: String::new(),
        first_line,
    };
    let Some(first) = lines.get(i) else {
        return empty;
    };
    let baseline = indent_of(first);
    if baseline <= marker_indent {
        return empty;
    }

    let mut body = Vec::new();
    for line in &lines[i..] {
        if is_blank(line) {
            body.push("");
            continue;
        }
        if indent_of(line) < baseline {
            break;
        }
        body.push(line[baseline..].trim_end());
    }
    while body.last().is_some_and(|l| l.is_empty()) {
        body.pop();
    }

    ExtractedBlock {
        file: file.to_path_buf(),
        text: body.join("\n"),
        first_line,
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Width in bytes of the leading whitespace.
fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t', '\x0c']).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn extract(source: &str, marker_line: u32) -> ExtractedBlock {
        extract_block(source, Path::new("m.lb"), marker_line)
    }

    #[test]
    fn extracts_dedented_body() {
        let source = "\
import x
deferred:
    from .a import A
    import b.c as c
class T:
    pass
";
        let block = extract(source, 2);
        assert_eq!(block.text(), "from .a import A\nimport b.c as c");
        assert_eq!(block.first_line(), 3);
        assert_eq!(block.absolute_line(2), 4);
    }

    #[test]
    fn leading_blank_lines_shift_first_line() {
        let source = "deferred:\n\n\n    import a\n\n    import b\nimport c\n";
        let block = extract(source, 1);
        assert_eq!(block.first_line(), 4);
        assert_eq!(block.text(), "import a\n\nimport b");
        assert_eq!(block.absolute_line(3), 6);
    }

    #[test]
    fn nested_marker_uses_its_own_indentation() {
        let source = "class T:\n    deferred:\n        import a\n    field x = 1\n";
        let block = extract(source, 2);
        assert_eq!(block.text(), "import a");
    }

    #[test]
    fn deeper_lines_keep_relative_indentation() {
        let source = "deferred:\n    if x:\n        import a\n    import b\n";
        assert_eq!(extract(source, 1).text(), "if x:\n    import a\nimport b");
    }

    #[test]
    fn block_without_indented_body_is_empty() {
        let block = extract("deferred:\nimport a\n", 1);
        assert!(block.is_empty());
        assert_eq!(extract("deferred:\n", 1).text(), "");
    }

    #[test]
    fn crlf_lines() {
        let block = extract("deferred:\r\n    import a\r\n    import b\r\n", 1);
        assert_eq!(block.text(), "import a\nimport b");
    }

    #[test]
    fn encoding_marker_in_first_two_lines() {
        assert_eq!(detect_encoding(b"# -*- coding: latin-1 -*-\n"), Some("latin-1".into()));
        assert_eq!(detect_encoding(b"#!/bin/lb\n# coding=utf8\n"), Some("utf8".into()));
        assert_eq!(detect_encoding(b"\n\n# coding: ascii\n"), None);
    }

    #[test]
    fn decoding() {
        let file = Path::new("m.lb");
        assert_eq!(decode(b"caf\xe9", "latin-1", file).unwrap(), "café");
        assert_eq!(decode("café".as_bytes(), "UTF_8", file).unwrap(), "café");
        assert_eq!(decode(b"\xEF\xBB\xBFabc", "utf-8", file).unwrap(), "abc");
        assert!(matches!(
            decode(b"caf\xe9", "utf-8", file),
            Err(DeferredError::Decode { .. })
        ));
        assert!(matches!(
            decode(b"caf\xe9", "ascii", file),
            Err(DeferredError::Decode { .. })
        ));
        assert!(matches!(
            decode(b"", "koi8-r", file),
            Err(DeferredError::UnsupportedEncoding { encoding, .. }) if encoding == "koi8-r"
        ));
    }

    #[test]
    fn read_source_honours_marker() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# coding: latin-1\nclass Caf\xe9:\n    pass\n").unwrap();
        let text = read_source(file.path(), "utf-8").unwrap();
        assert!(text.contains("Café"));

        let missing = read_source(Path::new("/nonexistent/x.lb"), "utf-8");
        assert!(matches!(missing, Err(DeferredError::Io { .. })));
    }
}

//! Line-level comment stripping for scenario text.

use crate::parser::GrammarVariant;

/// Remove a trailing comment from `line`, then trailing whitespace.
///
/// `//` starts a comment in every variant. Variants with hash comments also
/// treat `#` followed by whitespace (or at end of line) as a comment, so
/// `#Tag` selectors survive. Nothing inside a single- or double-quoted
/// string is a comment.
pub fn strip_comment(line: &str, variant: GrammarVariant) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'/' if bytes.get(i + 1) == Some(&b'/') => return line[..i].trim_end(),
            b'#' if variant.hash_comments()
                && bytes.get(i + 1).is_none_or(|n| n.is_ascii_whitespace()) =>
            {
                return line[..i].trim_end();
            }
            _ => {}
        }
    }
    line.trim_end()
}

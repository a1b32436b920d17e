//! Fenced code block extraction from free-form generator output.

const FENCE: &str = "```";

/// Content of the last complete ```` ``` ```` fenced block in `text`, trimmed.
///
/// A block opens with three backticks; anything after them up to the end of
/// that line (a language tag) is ignored. It closes at the next three
/// backticks. Blocks do not overlap. Returns `None` when no block is both
/// opened and closed.
pub fn extract_last_fenced_block(text: &str) -> Option<String> {
    let mut last = None;
    let mut pos = 0;

    while let Some(open) = text[pos..].find(FENCE).map(|i| pos + i) {
        let Some(body_start) = text[open + FENCE.len()..]
            .find('\n')
            .map(|i| open + FENCE.len() + i + 1)
        else {
            break;
        };
        let Some(close) = text[body_start..].find(FENCE).map(|i| body_start + i) else {
            break;
        };
        last = Some(&text[body_start..close]);
        pos = close + FENCE.len();
    }

    last.map(|body| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_block_wins() {
        let text = "draft:\n```joi\nfirst\n```\nfinal:\n```\nsecond\n```\n";
        assert_eq!(extract_last_fenced_block(text).as_deref(), Some("second"));
    }

    #[test]
    fn language_tag_is_ignored() {
        let text = "```joi lang\n  (#Light).switch_on()  \n```";
        assert_eq!(
            extract_last_fenced_block(text).as_deref(),
            Some("(#Light).switch_on()")
        );
    }

    #[test]
    fn no_fence() {
        assert_eq!(extract_last_fenced_block("just text"), None);
        assert_eq!(extract_last_fenced_block(""), None);
    }

    #[test]
    fn unterminated_block_is_ignored() {
        let text = "```\ncomplete\n```\n```\ndangling";
        assert_eq!(extract_last_fenced_block(text).as_deref(), Some("complete"));
        assert_eq!(extract_last_fenced_block("```\nnever closed"), None);
    }

    #[test]
    fn opening_fence_needs_a_newline() {
        assert_eq!(extract_last_fenced_block("```inline```"), None);
    }

    #[test]
    fn empty_block() {
        assert_eq!(extract_last_fenced_block("```\n```").as_deref(), Some(""));
    }
}

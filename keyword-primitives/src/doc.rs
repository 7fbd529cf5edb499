//! Documentation text normalisation.

/// Normalises keyword documentation.
///
/// Leading whitespace is stripped from the first line, the common indentation
/// of the remaining lines is removed, and leading and trailing blank lines are
/// dropped. Doc comments gathered from `///` lines therefore lose the space
/// that follows the slashes.
#[must_use]
pub fn clean_doc(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|ch| ch.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                line.trim_start()
            } else {
                strip_margin(line, margin)
            }
        })
        .collect();

    let start = cleaned
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(cleaned.len());
    let end = cleaned
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |last| last + 1);

    cleaned[start..end.max(start)].join("\n")
}

/// Removes up to `margin` leading whitespace characters.
fn strip_margin(line: &str, margin: usize) -> &str {
    let cut = line
        .char_indices()
        .take(margin)
        .take_while(|(_, ch)| ch.is_whitespace())
        .last()
        .map_or(0, |(index, ch)| index + ch.len_utf8());
    &line[cut..]
}

#[cfg(test)]
mod tests {
    use super::clean_doc;

    #[test]
    fn strips_doc_comment_indentation() {
        let raw = " Opens a new browser.\n\n Examples:\n     Open Browser  chrome";
        assert_eq!(
            clean_doc(raw),
            "Opens a new browser.\n\nExamples:\n    Open Browser  chrome"
        );
    }

    #[test]
    fn margin_counts_characters_not_bytes() {
        assert_eq!(
            clean_doc("Summary.\n\tfirst\n\u{3000}second"),
            "Summary.\nfirst\nsecond"
        );
        assert_eq!(
            clean_doc("Summary.\n\u{3000}\u{3000}nested\n  plain"),
            "Summary.\nnested\nplain"
        );
        assert_eq!(clean_doc("Summary.\n\u{3000} deeper\n\tless"), "Summary.\n deeper\nless");
    }

    #[test]
    fn drops_surrounding_blank_lines() {
        assert_eq!(clean_doc("\n\n   Text.\n   More.\n\n"), "Text.\nMore.");
    }

    #[test]
    fn empty_and_blank_documentation_is_empty() {
        assert_eq!(clean_doc(""), "");
        assert_eq!(clean_doc("  \n \n"), "");
    }
}

//! Cleanup for crawled legal content.
//!
//! Kenya Law pages come back with stray typeset-math markup and
//! private-use-area glyphs from PDF extraction. This pass strips both
//! before content reaches the markdown renderer. The cleanup is
//! idempotent: running it twice yields the first run's output.

use std::sync::LazyLock;

use regex::Regex;

static MATH_FONT_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\\(mathrm|mathbf|mathsf|pmb|boldsymbol)\s*\{([^}]*)\}")
        .expect("math font wrapper pattern")
});
static MATH_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$]+)\$").expect("math span pattern"));
static TEX_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[a-zA-Z]+").expect("tex command pattern"));
static PRIVATE_USE_AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{E000}-\u{F8FF}]").expect("private use area pattern"));
static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("repeated spaces pattern"));

/// Reduce one inline math expression to its readable residue.
fn sanitize_math_expression(expr: &str) -> String {
    let stripped = TEX_COMMAND.replace_all(expr, "");
    let plain: String = stripped
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '^'))
        .collect();
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip typeset-math escapes and PDF-extraction artifacts from crawled
/// content and collapse the leftover spacing.
pub fn sanitize_legal_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    // Unwrap font wrappers first so their arguments survive both inside
    // and outside `$...$` spans.
    let unwrapped = MATH_FONT_WRAPPER.replace_all(content, "$2");

    let without_math = MATH_SPAN.replace_all(&unwrapped, |caps: &regex::Captures<'_>| {
        let cleaned = sanitize_math_expression(&caps[1]);
        if cleaned.is_empty() {
            " ".to_string()
        } else {
            format!(" {cleaned} ")
        }
    });

    let without_pua = PRIVATE_USE_AREA.replace_all(&without_math, "");
    REPEATED_SPACES
        .replace_all(&without_pua, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::sanitize_legal_content;

    #[test]
    fn strips_math_spans_and_font_wrappers() {
        assert_eq!(
            sanitize_legal_content("$x^2$ and \\mathrm{foo}"),
            "x2 and foo"
        );
        assert_eq!(
            sanitize_legal_content("Section $\\mathbf{12}(a)$ applies."),
            "Section 12(a) applies."
        );
    }

    #[test]
    fn sanitization_is_idempotent() {
        let inputs = [
            "$x^2$ and \\mathrm{foo}",
            "plain prose stays as-is",
            "spaced    out   text",
            "artifact\u{E321}glyphs $\\alpha + \\beta$ here",
        ];
        for input in inputs {
            let once = sanitize_legal_content(input);
            let twice = sanitize_legal_content(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn removes_private_use_area_characters() {
        assert_eq!(sanitize_legal_content("a\u{E000}b\u{F8FF}c"), "abc");
    }

    #[test]
    fn collapses_repeated_spaces_and_trims() {
        assert_eq!(sanitize_legal_content("  the   ruling  "), "the ruling");
    }

    #[test]
    fn empty_and_unmatched_dollars_pass_through() {
        assert_eq!(sanitize_legal_content(""), "");
        assert_eq!(sanitize_legal_content("costs of $100"), "costs of $100");
    }

    #[test]
    fn math_only_span_leaves_single_space_between_words() {
        assert_eq!(sanitize_legal_content("before $\\quad$ after"), "before after");
    }
}

//! Best-effort cleanup of model-generated HTML fragments.
//!
//! Known limitations: only the listed preambles are recognised, only `#` to
//! `###` headings are converted, and fences are removed wherever they appear
//! (including inside legitimate code samples).

use std::sync::LazyLock;

use regex::Regex;

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:Sure!|Certainly!|I'd be happy to|Here's|Let's|I'll|Absolutely!|Great!|Of course!)[,\s]+(?:.*?\n|.*?create|.*?provide|.*?generate|.*?help)",
    )
    .expect("valid preamble regex")
});

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:html|json|markdown|md)?\s*").expect("valid fence regex")
});

static H3: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###[ \t]+(.*)$").expect("valid h3 regex"));
static H2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.*)$").expect("valid h2 regex"));
static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.*)$").expect("valid h1 regex"));

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---+$").expect("valid separator regex"));

/// Normalizes model output into an HTML fragment. Idempotent.
pub fn clean_text(raw: &str) -> String {
    // Each changing pass either removes a '#' or shortens the text,
    // so the loop reaches a fixed point.
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let cleaned = PREAMBLE.replace(text, "");
    let cleaned = FENCE.replace_all(&cleaned, "");
    let cleaned = H3.replace_all(&cleaned, "<h3>${1}</h3>");
    let cleaned = H2.replace_all(&cleaned, "<h2>${1}</h2>");
    let cleaned = H1.replace_all(&cleaned, "<h1>${1}</h1>");
    let cleaned = SEPARATOR.replace_all(&cleaned, "");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_preamble_line() {
        let input = "Sure! Here is your research notebook.\n<p>Acme builds rockets.</p>";
        assert_eq!(clean_text(input), "<p>Acme builds rockets.</p>");
    }

    #[test]
    fn test_strips_preamble_up_to_verb() {
        let input = "Certainly! I will create <div class=\"tip\">Know the product</div>";
        assert_eq!(clean_text(input), "<div class=\"tip\">Know the product</div>");
    }

    #[test]
    fn test_removes_code_fences() {
        let input = "```html\n<h3>Overview</h3>\n<p>Acme</p>\n```";
        assert_eq!(clean_text(input), "<h3>Overview</h3>\n<p>Acme</p>");
    }

    #[test]
    fn test_converts_markdown_headings() {
        let input = "# Acme\n## Culture\n### Values\n#### Untouched";
        assert_eq!(
            clean_text(input),
            "<h1>Acme</h1>\n<h2>Culture</h2>\n<h3>Values</h3>\n#### Untouched"
        );
    }

    #[test]
    fn test_removes_separator_lines() {
        let input = "<p>One</p>\n---\n<p>Two</p>";
        assert_eq!(clean_text(input), "<p>One</p>\n\n<p>Two</p>");
    }

    #[test]
    fn test_plain_html_is_untouched() {
        let input = "<div class=\"highlight\">Series B, 120 employees</div>";
        assert_eq!(clean_text(input), input);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n  "), "");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let samples = [
            "Sure! Here's what I'll provide\n# Acme\n```html\n<p>x</p>\n```",
            "Sure! Certainly! I'd be happy to help\nGreat! Let's create\n## Notes",
            "  ```\n# Heading behind a fence\n```  ",
            "Here's the plan, I'll generate# Tail heading",
            "---\n---\n### \n",
            "Of course!\n\n\n<p>done</p>",
            "plain text with a # in the middle and ``` stray fence",
        ];
        for sample in samples {
            let once = clean_text(sample);
            let twice = clean_text(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Pieces that exercise every rewrite rule, mixed with filler text.
        fn fragment() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("# ".to_string()),
                Just("## ".to_string()),
                Just("### ".to_string()),
                Just("```html\n".to_string()),
                Just("```".to_string()),
                Just("---".to_string()),
                Just("\n".to_string()),
                Just("Sure! ".to_string()),
                Just("Here's ".to_string()),
                Just(" create ".to_string()),
                "[a-zA-Z<>/ ]{0,10}",
            ]
        }

        proptest! {
            #[test]
            fn test_clean_text_is_idempotent_for_markup_mixes(
                parts in prop::collection::vec(fragment(), 0..16)
            ) {
                let once = clean_text(&parts.concat());
                let twice = clean_text(&once);
                prop_assert_eq!(twice, once);
            }

            #[test]
            fn test_clean_text_is_idempotent_for_any_text(raw in "\\PC{0,80}") {
                let once = clean_text(&raw);
                let twice = clean_text(&once);
                prop_assert_eq!(twice, once);
            }
        }
    }
}

// src/utils/html.rs

use std::collections::HashSet;

/// Strips markup from admin-entered quiz text (titles, sections, prompts).
///
/// Every tag is removed and `<script>` / `<style>` lose their content too.
/// The result is plain text: the entities ammonia's serializer emits for
/// text nodes are decoded again, so `Q&A: 3 < 5` is stored as typed.
pub fn strip_tags(input: &str) -> String {
    let cleaned = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string();

    // `&amp;` last so an escaped entity is not decoded twice.
    cleaned
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_script_bodies() {
        assert_eq!(strip_tags("Hello <script>alert(1)</script>"), "Hello ");
        assert_eq!(strip_tags("<b>Bold</b> move"), "Bold move");
        assert_eq!(strip_tags("<img src=x onerror=alert(1)>Pic"), "Pic");
    }

    #[test]
    fn plain_text_is_kept_as_typed() {
        assert_eq!(strip_tags("Plain title"), "Plain title");
        assert_eq!(strip_tags("Q&A: 3 < 5"), "Q&A: 3 < 5");
        assert_eq!(strip_tags("Fees & Charges"), "Fees & Charges");
        assert_eq!(strip_tags("5 > 3"), "5 > 3");
        assert_eq!(strip_tags("Tom &amp; Jerry"), "Tom & Jerry");
    }
}

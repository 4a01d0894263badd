//! Markdown rendering module
//!
//! Converts `.md` document content to an HTML fragment via pulldown-cmark.

use pulldown_cmark::{html, Options, Parser};

/// Render markdown text to an HTML fragment
pub fn render(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading() {
        let out = render("# About this wiki");
        assert!(out.contains("<h1>About this wiki</h1>"));
    }

    #[test]
    fn test_inline_html_passes_through() {
        let out = render("<h1>About this wiki</h1>");
        assert!(out.contains("<h1>About this wiki</h1>"));
    }

    #[test]
    fn test_image_reference() {
        let out = render("![image](/uploads/pic.png)");
        assert!(out.contains(r#"<img src="/uploads/pic.png""#));
    }

    #[test]
    fn test_plain_paragraph() {
        let out = render("just text");
        assert!(out.contains("<p>just text</p>"));
    }
}

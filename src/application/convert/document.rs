//! Markdown to HTML, rendered in process with `pulldown-cmark`.

use std::path::Path;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::domain::error::{AlfredError, Result};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Text of the first level-one heading, if any.
fn first_heading(markdown: &str) -> Option<String> {
    let mut in_heading = false;
    let mut title = String::new();
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Start(Tag::Heading { level: HeadingLevel::H1, .. }) => in_heading = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_heading => break,
            Event::Text(text) | Event::Code(text) if in_heading => title.push_str(&text),
            _ => {}
        }
    }
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A standalone HTML page for a markdown document.
pub fn render_page(markdown: &str, fallback_title: &str) -> String {
    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(markdown, options()));

    let title = first_heading(markdown).unwrap_or_else(|| fallback_title.to_string());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{}</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, sans-serif; max-width: 800px; margin: 0 auto; padding: 2rem; line-height: 1.6; }}
pre {{ background: #f4f4f4; padding: 1rem; overflow-x: auto; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ddd; padding: 0.4rem; }}
</style>
</head>
<body>
{}</body>
</html>
"#,
        escape(&title),
        body
    )
}

pub fn markdown_to_html(input: &Path, output: &Path) -> Result<()> {
    let markdown = std::fs::read_to_string(input).map_err(|e| AlfredError::io(input, e))?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    std::fs::write(output, render_page(&markdown, &stem)).map_err(|e| AlfredError::io(output, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_tables_and_title() {
        let page = render_page("# Trip <Notes>\n\n| a | b |\n|---|---|\n| 1 | 2 |\n", "notes");
        assert!(page.contains("<title>Trip &lt;Notes&gt;</title>"));
        assert!(page.contains("<table>"));
        assert!(page.contains("<td>2</td>"));
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let page = render_page("just text", "readme");
        assert!(page.contains("<title>readme</title>"));
        assert!(page.contains("<p>just text</p>"));
    }

    #[test]
    fn test_file_conversion() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("doc.md");
        std::fs::write(&input, "~~old~~ **new**").unwrap();
        let output = dir.path().join("doc.html");
        markdown_to_html(&input, &output).unwrap();

        let html = std::fs::read_to_string(output).unwrap();
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("<strong>new</strong>"));
    }
}

//! Text helpers for element content

use scraper::ElementRef;

/// Normalize whitespace line by line
///
/// Runs of whitespace inside a line collapse to one space, lines are trimmed,
/// blank lines are dropped and the rest are joined with `\n`.
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text that precedes the first child element
pub fn leading_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.children() {
        if node.value().is_element() {
            break;
        }
        if let Some(t) = node.value().as_text() {
            text.push_str(t);
        }
    }
    text
}

/// All descendant text, concatenated in document order
pub fn full_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Direct child text nodes, skipping whitespace-only ones
pub fn direct_texts(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
        .filter(|t| !t.trim().is_empty())
        .collect()
}

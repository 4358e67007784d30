//! Tag extraction for the device's XML-tagged plain-text responses.
//!
//! The management API does not emit real XML — just flat `<tag>value</tag>`
//! runs inside a `<response>` wrapper — so a substring scan is the whole
//! parser. A missing tag is `None`, never an error: callers decide whether
//! a field is required.

/// Extract the text between `<tag>` and `</tag>`, first occurrence.
pub fn extract_tag<'a>(tag: &str, body: &'a str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(&body[start..end])
}

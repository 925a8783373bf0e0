use std::collections::{HashMap, HashSet};

use ammonia::Builder;

/// Allowlist cleaner for blog bodies. Anything outside the list is dropped
/// before the content ever reaches storage.
pub fn sanitize_blog_html(input: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "br", "strong", "em", "u", "ol", "ul", "li", "h1", "h2", "h3", "h4", "h5", "h6",
        "blockquote", "a", "img", "code", "pre", "span", "div",
    ]
    .into_iter()
    .collect();

    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "title"].into_iter().collect());
    tag_attributes.insert("img", ["src", "alt", "width", "height"].into_iter().collect());
    tag_attributes.insert("span", ["class"].into_iter().collect());
    tag_attributes.insert("div", ["class"].into_iter().collect());

    Builder::default()
        .tags(tags)
        .tag_attributes(tag_attributes)
        .clean(input)
        .to_string()
}

/// Much narrower allowlist for comment bodies.
pub fn sanitize_comment_html(input: &str) -> String {
    let tags: HashSet<&str> = ["p", "br", "strong", "em", "u", "a"].into_iter().collect();

    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href"].into_iter().collect());

    Builder::default()
        .tags(tags)
        .tag_attributes(tag_attributes)
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tags_are_stripped_from_blog_content() {
        let dirty = "<p>hello</p><script>alert('xss')</script>";
        let clean = sanitize_blog_html(dirty);
        assert!(clean.contains("<p>hello</p>"));
        assert!(!clean.contains("<script>"));
    }

    #[test]
    fn allowed_formatting_survives() {
        let input = "<h2>Title</h2><p><strong>bold</strong> and <em>italic</em></p>";
        assert_eq!(sanitize_blog_html(input), input);
    }

    #[test]
    fn event_handler_attributes_are_dropped() {
        let dirty = r#"<p onclick="steal()">text</p>"#;
        let clean = sanitize_blog_html(dirty);
        assert!(!clean.contains("onclick"));
        assert!(clean.contains("text"));
    }

    #[test]
    fn comments_reject_headings_and_images() {
        let dirty = r#"<h1>big</h1><img src="x.png"><strong>ok</strong>"#;
        let clean = sanitize_comment_html(dirty);
        assert!(!clean.contains("<h1>"));
        assert!(!clean.contains("<img"));
        assert!(clean.contains("<strong>ok</strong>"));
    }
}

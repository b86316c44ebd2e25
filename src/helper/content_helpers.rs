use regex::Regex;
use std::collections::HashSet;

const EXCERPT_MAX_CHARS: usize = 160;

/// Derives a URL-safe slug from a post title: lowercase, ASCII alphanumeric,
/// hyphen-separated. Pure function of the title text.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Escapes HTML in Markdown content while preserving fenced code blocks
/// (```) untouched. Existing entities are decoded first so content edited
/// repeatedly does not accumulate escaping.
pub fn sanitize_markdown_content(markdown_input: &str) -> String {
    let mut code_blocks: Vec<String> = Vec::new();
    let code_block_regex = Regex::new(r"(?s)```[\s\S]*?```").unwrap();

    let with_placeholders = code_block_regex.replace_all(markdown_input, |caps: &regex::Captures| {
        code_blocks.push(caps[0].to_string());
        format!("__CODE_BLOCK_PLACEHOLDER_{}__", code_blocks.len() - 1)
    });

    let decoded = html_escape::decode_html_entities(&with_placeholders);
    let escaped = html_escape::encode_text(&decoded).to_string();

    let mut final_output = escaped;
    for (i, block) in code_blocks.iter().enumerate() {
        let placeholder = format!("__CODE_BLOCK_PLACEHOLDER_{}__", i);
        final_output = final_output.replacen(&placeholder, block, 1);
    }

    final_output
}

/// Strips all HTML tags from input (for titles/excerpts).
pub fn strip_all_html(input: &str) -> String {
    ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}

/// Builds a short plain-text excerpt from post content when the editor left
/// the excerpt field empty.
pub fn derive_excerpt(content: &str) -> String {
    let stripped = strip_all_html(content);
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= EXCERPT_MAX_CHARS {
        return collapsed;
    }

    let truncated: String = collapsed.chars().take(EXCERPT_MAX_CHARS).collect();
    // Cut back to the last full word before appending the ellipsis.
    let cut = truncated.rfind(' ').unwrap_or(truncated.len());
    format!("{}…", &truncated[..cut])
}

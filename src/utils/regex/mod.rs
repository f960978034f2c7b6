use regex::Regex;
use std::sync::LazyLock;

/// Compiled markdown patterns shared by channel renderers
pub struct RegexPatterns;

impl RegexPatterns {
    /// Regex for matching markdown bold (**text**)
    pub fn markdown_bold() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"\*\*(.+?)\*\*").expect("Failed to compile markdown bold regex")
        });
        &RE
    }

    /// Regex for matching markdown strike-through (~~text~~)
    pub fn markdown_strike() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"~~(.+?)~~").expect("Failed to compile markdown strike regex")
        });
        &RE
    }

    /// Regex for matching markdown links ([text](url))
    pub fn markdown_link() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"\[([^\]]+)\]\(([^)\s"]+)\)"#).expect("Failed to compile markdown link regex")
        });
        &RE
    }

    /// Regex for matching markdown italic (_text_). Underscores inside
    /// identifiers such as `snake_case_name` do not match.
    pub fn markdown_italic() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"\b_([^_\n]+)_\b").expect("Failed to compile markdown italic regex")
        });
        &RE
    }

    /// Regex for matching inline code and fenced code blocks
    pub fn markdown_code() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"```(?:[\w+-]*\n)?([\s\S]*?)```|`([^`\n]+)`")
                .expect("Failed to compile markdown code regex")
        });
        &RE
    }

    /// Regex for markdown headings (# Title)
    pub fn markdown_heading() -> &'static Regex {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?m)^#{1,6}[ \t]+(.+?)[ \t]*#*$").expect("Failed to compile markdown heading regex")
        });
        &RE
    }
}

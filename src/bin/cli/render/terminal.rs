use std::sync::OnceLock;

use regex::Regex;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn checkbox_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[-*] \[([ xX])\] (.*)$").expect("valid checkbox regex"))
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[-*+] (.*)$").expect("valid bullet regex"))
}

/// Render a Markdown document for the terminal.
///
/// The frontmatter header is dimmed; headings, lists, quotes and code
/// fences get light styling. Text is otherwise printed as written.
pub fn render_document(document: &str, use_color: bool) -> String {
    let mut lines = Vec::new();
    let mut in_header = false;
    let mut in_code = false;

    for (i, line) in document.lines().enumerate() {
        if line == "---" && (i == 0 || in_header) {
            in_header = i == 0;
            lines.push(paint(line, Color::DIM, use_color));
            continue;
        }
        if in_header {
            lines.push(paint(line, Color::DIM, use_color));
            continue;
        }

        if line.trim_start().starts_with("```") {
            in_code = !in_code;
            lines.push(paint(line, Color::GRAY, use_color));
            continue;
        }
        if in_code {
            lines.push(paint(line, Color::CYAN, use_color));
            continue;
        }

        lines.push(render_line(line, use_color));
    }

    lines.join("\n")
}

fn render_line(line: &str, use_color: bool) -> String {
    if line.starts_with('#') {
        return paint(line, Color::BOLD, use_color);
    }
    if let Some(quote) = line.strip_prefix('>') {
        return paint(&format!("\u{2502}{}", quote), Color::GRAY, use_color);
    }
    if let Some(caps) = checkbox_regex().captures(line) {
        let done = &caps[2] != " ";
        let mark = if done { "\u{2611}" } else { "\u{2610}" };
        let text = if done {
            paint(&caps[3], Color::DIM, use_color)
        } else {
            caps[3].to_string()
        };
        return format!("{}{} {}", &caps[1], mark, text);
    }
    if let Some(caps) = bullet_regex().captures(line) {
        return format!("{}\u{2022} {}", &caps[1], &caps[2]);
    }
    line.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plain() {
        let doc = "---\ntitle: A\n---\n\n# Heading\n- item\n- [x] done\n- [ ] open\n> quoted";
        let rendered = render_document(doc, false);
        assert_eq!(
            rendered,
            "---\ntitle: A\n---\n\n# Heading\n\u{2022} item\n\u{2611} done\n\u{2610} open\n\u{2502} quoted"
        );
    }

    #[test]
    fn test_dashes_in_body_are_not_header() {
        let rendered = render_document("text\n---\nmore", true);
        assert!(!rendered.contains(Color::DIM));
    }

    #[test]
    fn test_code_fence_untouched() {
        let rendered = render_document("```\n- not a bullet\n```", false);
        assert_eq!(rendered, "```\n- not a bullet\n```");
    }
}

//! Response body rendering with per-theme JSON highlighting
//!
//! The style table for the current theme lives in a [`StyleCache`] owned by
//! the [`Highlighter`]; whoever changes the theme invalidates it.

use ratatui::prelude::*;
use serde::de::IgnoredAny;

pub const DEFAULT_THEME: &str = "default";

/// Themes offered in the preferences dialog
pub const THEMES: [&str; 4] = [DEFAULT_THEME, "monokai", "solarized", "mono"];

/// Style per JSON token class
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenStyles {
    pub key: Style,
    pub string: Style,
    pub number: Style,
    pub literal: Style,
    pub punct: Style,
    pub plain: Style,
}

impl TokenStyles {
    fn for_theme(theme: &str) -> Self {
        match theme {
            "monokai" => TokenStyles {
                key: Style::default().fg(Color::Rgb(102, 217, 239)),
                string: Style::default().fg(Color::Rgb(230, 219, 116)),
                number: Style::default().fg(Color::Rgb(174, 129, 255)),
                literal: Style::default().fg(Color::Rgb(249, 38, 114)),
                punct: Style::default().fg(Color::Rgb(248, 248, 242)),
                plain: Style::default().fg(Color::Rgb(248, 248, 242)),
            },
            "solarized" => TokenStyles {
                key: Style::default().fg(Color::Rgb(38, 139, 210)),
                string: Style::default().fg(Color::Rgb(42, 161, 152)),
                number: Style::default().fg(Color::Rgb(211, 54, 130)),
                literal: Style::default().fg(Color::Rgb(181, 137, 0)),
                punct: Style::default().fg(Color::Rgb(147, 161, 161)),
                plain: Style::default().fg(Color::Rgb(131, 148, 150)),
            },
            "mono" => TokenStyles {
                key: Style::default().bold(),
                string: Style::default(),
                number: Style::default(),
                literal: Style::default().italic(),
                punct: Style::default().fg(Color::DarkGray),
                plain: Style::default(),
            },
            _ => TokenStyles {
                key: Style::default().fg(Color::Cyan),
                string: Style::default().fg(Color::Green),
                number: Style::default().fg(Color::Yellow),
                literal: Style::default().fg(Color::Magenta),
                punct: Style::default().fg(Color::Yellow),
                plain: Style::default(),
            },
        }
    }
}

/// Style table built for one theme, kept until invalidated
#[derive(Debug, Default)]
pub struct StyleCache {
    entry: Option<(String, TokenStyles)>,
}

impl StyleCache {
    pub fn styles_for(&mut self, theme: &str) -> TokenStyles {
        match &self.entry {
            Some((cached, styles)) if cached == theme => *styles,
            _ => {
                let styles = TokenStyles::for_theme(theme);
                self.entry = Some((theme.to_string(), styles));
                styles
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn cached_theme(&self) -> Option<&str> {
        self.entry.as_ref().map(|(theme, _)| theme.as_str())
    }
}

#[derive(Debug, Default)]
pub struct Highlighter {
    cache: StyleCache,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &StyleCache {
        &self.cache
    }

    /// Drop cached styles; call whenever the theme setting changes
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Turn a response body into display lines
    ///
    /// JSON is re-indented from the received text, never re-serialized, so
    /// key order and number formatting stay exactly as sent. With
    /// `highlight` off every body renders as plain lines.
    pub fn render(
        &mut self,
        content_type: &str,
        body: &[u8],
        theme: &str,
        highlight: bool,
    ) -> Vec<Line<'static>> {
        if body.is_empty() {
            return Vec::new();
        }

        let text = String::from_utf8_lossy(body);
        if !highlight {
            return text.lines().map(|line| Line::raw(line.to_string())).collect();
        }

        let styles = self.cache.styles_for(theme);
        let declared_json = content_type.to_ascii_lowercase().contains("json");
        let parses = (declared_json || content_type.is_empty())
            && serde_json::from_str::<IgnoredAny>(&text).is_ok();

        if parses {
            highlight_json(&reindent_json(&text), &styles)
        } else if declared_json {
            highlight_json(&text, &styles)
        } else {
            text.lines()
                .map(|line| Line::styled(line.to_string(), styles.plain))
                .collect()
        }
    }
}

/// Two-space indentation of a valid JSON document, tokens copied verbatim
fn reindent_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut chars = text.chars().peekable();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                out.push(c);
                while chars.peek().is_some_and(|next| next.is_whitespace()) {
                    chars.next();
                }
                match chars.peek() {
                    // empty container stays on one line
                    Some('}' | ']') => {
                        if let Some(close) = chars.next() {
                            out.push(close);
                        }
                    }
                    _ => {
                        depth += 1;
                        push_newline(&mut out, depth);
                    }
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                push_newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                push_newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }

    out
}

fn push_newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Token-level JSON colouring, one [`Line`] per input line
pub fn highlight_json(text: &str, styles: &TokenStyles) -> Vec<Line<'static>> {
    text.lines().map(|line| highlight_line(line, styles)).collect()
}

fn highlight_line(line: &str, styles: &TokenStyles) -> Line<'static> {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < len {
        let start = i;
        match chars[i] {
            '"' => {
                i += 1;
                while i < len {
                    match chars[i] {
                        '\\' => i += 2,
                        '"' => {
                            i += 1;
                            break;
                        }
                        _ => i += 1,
                    }
                }
                let end = i.min(len);
                i = end;
                let is_key = chars[end..].iter().find(|c| !c.is_whitespace()) == Some(&':');
                let style = if is_key { styles.key } else { styles.string };
                spans.push(Span::styled(collect(&chars[start..end]), style));
            }
            '{' | '}' | '[' | ']' | ':' | ',' => {
                i += 1;
                spans.push(Span::styled(chars[start].to_string(), styles.punct));
            }
            c if c == '-' || c.is_ascii_digit() => {
                while i < len && matches!(chars[i], '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                    i += 1;
                }
                spans.push(Span::styled(collect(&chars[start..i]), styles.number));
            }
            c if c.is_ascii_alphabetic() => {
                while i < len && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let word = collect(&chars[start..i]);
                let style = match word.as_str() {
                    "true" | "false" | "null" => styles.literal,
                    _ => styles.plain,
                };
                spans.push(Span::styled(word, style));
            }
            _ => {
                i += 1;
                while i < len && !is_token_start(chars[i]) {
                    i += 1;
                }
                spans.push(Span::styled(collect(&chars[start..i]), styles.plain));
            }
        }
    }

    Line::from(spans)
}

fn is_token_start(c: char) -> bool {
    matches!(c, '"' | '{' | '}' | '[' | ']' | ':' | ',' | '-') || c.is_ascii_alphanumeric()
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

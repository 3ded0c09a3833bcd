//! JSON syntax highlighting for the HTML renderer.
//!
//! Output follows the Pygments HTML conventions (`<div class="highlight">`
//! wrapping `<span>`s with short token classes) so existing Pygments style
//! sheets apply unchanged.

use super::serializers::escape_html;

/// Turns source text into highlighted HTML.
pub trait Highlighter: Send + Sync {
    /// Highlighted markup for `code`.
    fn highlight(&self, code: &str) -> String;

    /// CSS rules for the classes [`Highlighter::highlight`] emits.
    fn style_defs(&self) -> String;
}

/// Highlighter for JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHighlighter;

const STYLE_DEFS: &str = "\
.highlight { background: #f8f8f8; }
.highlight .p { color: #000000 }
.highlight .nt { color: #008000; font-weight: bold }
.highlight .s2 { color: #BA2121 }
.highlight .mi { color: #666666 }
.highlight .mf { color: #666666 }
.highlight .kc { color: #008000; font-weight: bold }
.highlight .err { border: 1px solid #FF0000 }";

impl Highlighter for JsonHighlighter {
    fn highlight(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len() * 2);
        out.push_str("<div class=\"highlight\"><pre>");

        let chars: Vec<char> = code.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let start = i;
            let class = match c {
                '"' => {
                    i += 1;
                    while i < chars.len() && chars[i] != '"' {
                        if chars[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    i = (i + 1).min(chars.len());
                    if next_significant(&chars, i) == Some(':') {
                        "nt"
                    } else {
                        "s2"
                    }
                }
                '-' | '0'..='9' => {
                    while i < chars.len() && matches!(chars[i], '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                        i += 1;
                    }
                    if chars[start..i].iter().any(|c| matches!(c, '.' | 'e' | 'E')) {
                        "mf"
                    } else {
                        "mi"
                    }
                }
                'a'..='z' => {
                    while i < chars.len() && chars[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    "kc"
                }
                '{' | '}' | '[' | ']' | ',' | ':' => {
                    i += 1;
                    "p"
                }
                c if c.is_whitespace() => {
                    out.push(c);
                    i += 1;
                    continue;
                }
                _ => {
                    i += 1;
                    "err"
                }
            };

            let token: String = chars[start..i].iter().collect();
            out.push_str(&format!("<span class=\"{}\">{}</span>", class, escape_html(&token)));
        }

        out.push_str("</pre></div>\n");
        out
    }

    fn style_defs(&self) -> String {
        STYLE_DEFS.to_string()
    }
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

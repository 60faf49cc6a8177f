//! HTML tokenizer.
//!
//! A forgiving scanner that turns markup into a flat `Vec<Token>`.
//! Covers tags, quoted and unquoted attributes, comments, DOCTYPE,
//! character references, raw text (`<script>`, `<style>`) and RCDATA
//! (`<title>`, `<textarea>`). Malformed input is always handled
//! gracefully: stray `<` becomes text and unterminated constructs run
//! to end of input. The tokenizer never panics.

use crate::entities::lookup_entity;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// A single token emitted by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag(StartTagToken),
    EndTag(String),
    Character(String),
    Comment(String),
    Doctype(String),
    Eof,
}

/// An opening tag with attributes and self-closing flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StartTagToken {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    /// Create a new tokenizer over the given UTF-8 input.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Consume the input and return the token stream, ending in `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while self.pos < self.input.len() {
            if self.peek() == Some('<') {
                match self.markup() {
                    Some(token) => {
                        let raw_tag = match &token {
                            Token::StartTag(tag) if !tag.self_closing => Some(tag.name.clone()),
                            _ => None,
                        };
                        tokens.push(token);
                        if let Some(name) = raw_tag {
                            self.content_after_start_tag(&name, &mut tokens);
                        }
                    },
                    None => {
                        self.pos += 1;
                        push_text(&mut tokens, "<");
                    },
                }
            } else {
                let text = self.text_until_tag();
                push_text(&mut tokens, &decode_entities(&text));
            }
        }
        tokens.push(Token::Eof);
        tokens
    }

    // -- helpers ------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    /// Case-insensitive look-ahead at the current position.
    fn starts_with_ci(&self, s: &str) -> bool {
        let mut idx = self.pos;
        for expected in s.chars() {
            match self.input.get(idx) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => idx += 1,
                _ => return false,
            }
        }
        true
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Collect characters up to (not including) `terminator`, consuming
    /// the terminator. Runs to end of input when it never appears.
    fn take_until(&mut self, terminator: &str) -> String {
        let needle: Vec<char> = terminator.chars().collect();
        let start = self.pos;
        while self.pos < self.input.len() {
            if self.input[self.pos..].starts_with(&needle) {
                let out: String = self.input[start..self.pos].iter().collect();
                self.pos += needle.len();
                return out;
            }
            self.pos += 1;
        }
        self.input[start..].iter().collect()
    }

    fn text_until_tag(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '<') {
            self.pos += 1;
        }
        self.input[start..self.pos].iter().collect()
    }

    // -- markup -------------------------------------------------------------

    /// Tokenize the construct starting at `<`. Returns `None` (without
    /// consuming) when the `<` does not open any markup.
    fn markup(&mut self) -> Option<Token> {
        match self.peek_at(1)? {
            '!' => {
                self.pos += 2;
                if self.starts_with_ci("--") {
                    self.pos += 2;
                    Some(Token::Comment(self.take_until("-->")))
                } else if self.starts_with_ci("doctype") {
                    self.pos += "doctype".len();
                    Some(Token::Doctype(self.take_until(">").trim().to_string()))
                } else {
                    Some(Token::Comment(self.take_until(">")))
                }
            },
            '?' => {
                self.pos += 2;
                Some(Token::Comment(self.take_until(">")))
            },
            '/' => {
                if !self.peek_at(2).is_some_and(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                self.pos += 2;
                let name = self.tag_name();
                self.take_until(">");
                Some(Token::EndTag(name))
            },
            c if c.is_ascii_alphabetic() => {
                self.pos += 1;
                Some(Token::StartTag(self.start_tag()))
            },
            _ => None,
        }
    }

    fn tag_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_ascii_whitespace() && c != '>' && c != '/')
        {
            self.pos += 1;
        }
        self.input[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase()
    }

    fn start_tag(&mut self) -> StartTagToken {
        let name = self.tag_name();
        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    break;
                },
                Some('/') => {
                    self.pos += 1;
                    if self.peek() == Some('>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                },
                Some(_) => {
                    // A leading `=` yields an empty name; the value is
                    // consumed and dropped. First occurrence wins.
                    let (attr_name, value) = self.attribute();
                    if !attr_name.is_empty() && !attributes.iter().any(|(n, _)| *n == attr_name) {
                        attributes.push((attr_name, value));
                    }
                },
            }
        }
        StartTagToken {
            name,
            attributes,
            self_closing,
        }
    }

    fn attribute(&mut self) -> (String, String) {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_ascii_whitespace() && !matches!(c, '=' | '>' | '/'))
        {
            self.pos += 1;
        }
        let name = self.input[start..self.pos]
            .iter()
            .collect::<String>()
            .to_ascii_lowercase();
        self.skip_whitespace();
        if self.peek() != Some('=') {
            return (name, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        let raw = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.take_until(&quote.to_string())
            },
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_ascii_whitespace() && c != '>')
                {
                    self.pos += 1;
                }
                self.input[start..self.pos].iter().collect()
            },
        };
        (name, decode_entities(&raw))
    }

    /// After a start tag, consume raw text / RCDATA content up to the
    /// matching end tag.
    fn content_after_start_tag(&mut self, name: &str, tokens: &mut Vec<Token>) {
        let rawtext = matches!(name, "script" | "style");
        let rcdata = matches!(name, "title" | "textarea");
        if !rawtext && !rcdata {
            return;
        }
        let closing = format!("</{name}");
        let start = self.pos;
        while self.pos < self.input.len() && !self.starts_with_ci(&closing) {
            self.pos += 1;
        }
        let content: String = self.input[start..self.pos].iter().collect();
        if !content.is_empty() {
            let text = if rcdata {
                decode_entities(&content)
            } else {
                content
            };
            tokens.push(Token::Character(text));
        }
        if self.pos < self.input.len() {
            self.pos += closing.chars().count();
            self.take_until(">");
            tokens.push(Token::EndTag(name.to_string()));
        }
    }
}

/// Coalesce consecutive `Character` tokens.
fn push_text(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Character(prev)) = tokens.last_mut() {
        prev.push_str(text);
        return;
    }
    tokens.push(Token::Character(text.to_string()));
}

/// Replace character references (`&amp;`, `&#65;`, `&#x41;`) in `text`.
/// Unknown or malformed references are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let end = rest[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .map(|i| i + 1)
            .unwrap_or(rest.len());
        let name = &rest[1..end];
        let has_semicolon = rest[end..].starts_with(';');
        match resolve_reference(name) {
            Some(resolved) => {
                out.push_str(&resolved);
                rest = &rest[end + usize::from(has_semicolon)..];
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        let ch = char::from_u32(code).filter(|&c| c != '\0').unwrap_or('\u{FFFD}');
        return Some(ch.to_string());
    }
    lookup_entity(name).map(str::to_string)
}

//! Compound CSS selectors.
//!
//! Supports what the navigator needs to locate content regions and
//! links: type (`main`), id (`#content`), class (`.page`), attribute
//! presence (`[data-no-pjax]`) and equality (`[rel="home"]`), any
//! combination of those on one element, and comma-separated lists.
//! Combinators and pseudo-classes are not supported.

use crate::dom::ElementData;

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    /// Parse a selector list. Returns `None` for empty input or syntax
    /// outside the supported subset.
    pub fn parse(source: &str) -> Option<Self> {
        let alternatives = source
            .split(',')
            .map(|part| Compound::parse(part.trim()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    /// A selector matching elements with the given tag.
    pub fn tag(tag: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                tag: Some(tag.to_ascii_lowercase()),
                ..Compound::default()
            }],
        }
    }

    pub fn matches(&self, element: &ElementData) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    fn parse(source: &str) -> Option<Self> {
        if source.is_empty() {
            return None;
        }
        let mut compound = Compound::default();
        let chars: Vec<char> = source.chars().collect();
        let mut pos = 0;

        let ident = |pos: &mut usize| -> String {
            let start = *pos;
            while *pos < chars.len() && is_ident_char(chars[*pos]) {
                *pos += 1;
            }
            chars[start..*pos].iter().collect()
        };

        if chars[0] == '*' {
            pos = 1;
        } else if is_ident_char(chars[0]) {
            compound.tag = Some(ident(&mut pos).to_ascii_lowercase());
        }

        while pos < chars.len() {
            match chars[pos] {
                '#' => {
                    pos += 1;
                    let id = ident(&mut pos);
                    if id.is_empty() {
                        return None;
                    }
                    compound.id = Some(id);
                },
                '.' => {
                    pos += 1;
                    let class = ident(&mut pos);
                    if class.is_empty() {
                        return None;
                    }
                    compound.classes.push(class);
                },
                '[' => {
                    let close = chars[pos..].iter().position(|&c| c == ']')? + pos;
                    let inner: String = chars[pos + 1..close].iter().collect();
                    compound.attributes.push(parse_attribute(&inner)?);
                    pos = close + 1;
                },
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag
            && element.tag != *tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id() != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            Some(expected) => element.get_attribute(name) == Some(expected.as_str()),
            None => element.has_attribute(name),
        })
    }
}

fn parse_attribute(inner: &str) -> Option<(String, Option<String>)> {
    match inner.split_once('=') {
        Some((name, value)) => {
            let name = name.trim();
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), Some(value.to_string())))
        },
        None => {
            let name = inner.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), None))
        },
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

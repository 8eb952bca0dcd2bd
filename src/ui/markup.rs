// Markup reader: parses the XML subset used by UI files into an Element tree

use super::element::Element;
use thiserror::Error;

/// Error type for markup parsing
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Line {line}: {message}")]
pub struct MarkupError {
    pub line: usize,
    pub message: String,
}

/// Parses a markup document and returns its root element.
///
/// Supported: elements, single or double quoted attributes, text,
/// comments, `<?...?>` processing instructions and the five predefined
/// entities. Text of an element is the trimmed concatenation of its text
/// nodes.
pub fn parse(source: &str) -> Result<Element, MarkupError> {
    let mut reader = Reader::new(source);
    reader.skip_misc()?;
    let root = reader.parse_element()?;
    reader.skip_misc()?;
    if reader.peek().is_some() {
        return Err(reader.error("Unexpected content after root element"));
    }
    Ok(root)
}

struct Reader<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Reader {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        MarkupError {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), MarkupError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("Expected '{}', got '{}'", expected, c))),
            None => Err(self.error(format!("Expected '{}', got end of input", expected))),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Consumes characters up to and including `terminator`
    fn skip_until(&mut self, terminator: &str) -> Result<(), MarkupError> {
        let mut window = String::new();
        while let Some(c) = self.bump() {
            window.push(c);
            if window.ends_with(terminator) {
                return Ok(());
            }
        }
        Err(self.error(format!("Unterminated construct, expected '{}'", terminator)))
    }

    /// Skips whitespace, comments and processing instructions around elements
    fn skip_misc(&mut self) -> Result<(), MarkupError> {
        loop {
            self.skip_ws();
            if self.peek() != Some('<') {
                return Ok(());
            }
            let mut lookahead = self.chars.clone();
            lookahead.next();
            match lookahead.next() {
                Some('?') => self.skip_until("?>")?,
                Some('!') => self.skip_until("-->")?,
                _ => return Ok(()),
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, MarkupError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("Expected a name"));
        }
        Ok(name)
    }

    fn parse_attribute_value(&mut self) -> Result<String, MarkupError> {
        let quote = match self.bump() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("Attribute value must be quoted")),
        };
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some(c) => raw.push(c),
                None => return Err(self.error("Unterminated attribute value")),
            }
        }
        self.decode_entities(&raw)
    }

    fn parse_element(&mut self) -> Result<Element, MarkupError> {
        self.expect('<')?;
        let name = self.parse_name()?;
        let mut element = Element::new(name.clone());

        // Attributes
        loop {
            self.skip_ws();
            match self.peek() {
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    return Ok(element);
                }
                Some('>') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let attr_name = self.parse_name()?;
                    self.skip_ws();
                    self.expect('=')?;
                    self.skip_ws();
                    let value = self.parse_attribute_value()?;
                    if element.attribute(&attr_name).is_some() {
                        return Err(self.error(format!("Duplicate attribute '{}'", attr_name)));
                    }
                    element.set_attribute(attr_name, value);
                }
                None => return Err(self.error(format!("Unterminated tag <{}>", name))),
            }
        }

        // Content
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('<') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            self.bump();
                            self.bump();
                            let closing = self.parse_name()?;
                            if closing != name {
                                return Err(self.error(format!(
                                    "Mismatched closing tag: expected </{}>, got </{}>",
                                    name, closing
                                )));
                            }
                            self.skip_ws();
                            self.expect('>')?;
                            break;
                        }
                        Some('!') | Some('?') => self.skip_misc_in_content()?,
                        _ => {
                            let child = self.parse_element()?;
                            element.children_mut().push(child);
                        }
                    }
                }
                Some(_) => {
                    let mut raw = String::new();
                    while let Some(c) = self.peek() {
                        if c == '<' {
                            break;
                        }
                        raw.push(c);
                        self.bump();
                    }
                    let decoded = self.decode_entities(raw.trim())?;
                    if !decoded.is_empty() {
                        if !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(&decoded);
                    }
                }
                None => return Err(self.error(format!("Missing closing tag </{}>", name))),
            }
        }
        if !text.is_empty() {
            element.set_text(Some(text));
        }
        Ok(element)
    }

    fn skip_misc_in_content(&mut self) -> Result<(), MarkupError> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        match lookahead.next() {
            Some('?') => self.skip_until("?>"),
            _ => self.skip_until("-->"),
        }
    }

    fn decode_entities(&self, raw: &str) -> Result<String, MarkupError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find('&') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            let end = tail
                .find(';')
                .ok_or_else(|| self.error("Unterminated entity reference"))?;
            let decoded = match &tail[1..end] {
                "lt" => '<',
                "gt" => '>',
                "amp" => '&',
                "quot" => '"',
                "apos" => '\'',
                other => return Err(self.error(format!("Unknown entity '&{};'", other))),
            };
            out.push(decoded);
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

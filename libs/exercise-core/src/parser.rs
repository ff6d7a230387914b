//! Reading-pack parser.
//!
//! # Format
//! ```text
//! ID: desayuno
//! Topic: comida
//! Tier: basic
//! Text: El niño come manzanas.
//! El niño come manzanas rojas.
//!
//! Después bebe un vaso de leche.
//!
//! ID: viaje
//! Text: Mi hermano viaja en tren.
//! ```
//!
//! `Text:` runs until the next field line, so blank lines inside it are kept
//! as paragraph breaks. `ID:`, `Topic:` and `Tier:` are optional; a text
//! without an ID is named after the line its block starts on.

use std::collections::HashSet;

use crate::error::ParseError;
use crate::store::SourceText;
use crate::types::DifficultyTier;

/// Parse a reading pack into source texts.
pub fn parse_pack(content: &str) -> Result<Vec<SourceText>, ParseError> {
    let mut parser = Parser::default();
    for (idx, line) in content.lines().enumerate() {
        parser.process_line(line, idx + 1)?;
    }
    let texts = parser.finalize()?;
    if texts.is_empty() {
        return Err(ParseError::EmptyPack);
    }
    Ok(texts)
}

struct TextBuilder {
    id: Option<String>,
    topic: Option<String>,
    tier: Option<DifficultyTier>,
    body: Option<String>,
    start_line: usize,
}

impl TextBuilder {
    fn new(start_line: usize) -> Self {
        Self {
            id: None,
            topic: None,
            tier: None,
            body: None,
            start_line,
        }
    }

    fn build(self) -> Result<SourceText, ParseError> {
        let body = self
            .body
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .ok_or(ParseError::MissingText {
                line: self.start_line,
            })?;

        Ok(SourceText {
            id: self.id.unwrap_or_else(|| format!("text-{}", self.start_line)),
            topic: self.topic,
            tier: self.tier,
            body,
        })
    }
}

#[derive(Default)]
struct Parser {
    current: Option<TextBuilder>,
    in_body: bool,
    buffer: Vec<String>,
    texts: Vec<SourceText>,
    seen_ids: HashSet<String>,
}

enum LineType<'a> {
    Id(&'a str),
    Topic(&'a str),
    Tier(&'a str),
    Text(&'a str),
    Plain(&'a str),
}

impl Parser {
    fn parse_line(line: &str) -> LineType<'_> {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("ID:") {
            LineType::Id(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Topic:") {
            LineType::Topic(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Tier:") {
            LineType::Tier(rest.trim())
        } else if let Some(rest) = trimmed.strip_prefix("Text:") {
            LineType::Text(rest.trim())
        } else {
            LineType::Plain(line)
        }
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), ParseError> {
        match Self::parse_line(line) {
            LineType::Id(id) => {
                self.start_block(line_num, true)?;
                if let Some(text) = self.current.as_mut() {
                    text.id = Some(id.to_string());
                }
            }
            LineType::Topic(topic) => {
                self.start_block(line_num, false)?;
                if let Some(text) = self.current.as_mut() {
                    text.topic = Some(topic.to_string()).filter(|t| !t.is_empty());
                }
            }
            LineType::Tier(value) => {
                self.start_block(line_num, false)?;
                let tier = DifficultyTier::from_str(value).ok_or_else(|| ParseError::InvalidTier {
                    line: line_num,
                    value: value.to_string(),
                })?;
                if let Some(text) = self.current.as_mut() {
                    text.tier = Some(tier);
                }
            }
            LineType::Text(first) => {
                self.start_block(line_num, false)?;
                self.in_body = true;
                self.buffer.push(first.to_string());
            }
            LineType::Plain(text) => {
                if self.in_body {
                    self.buffer.push(text.trim_end().to_string());
                }
            }
        }
        Ok(())
    }

    /// Finish the current block if `line` opens a new one. An `ID:` always
    /// does; any other field only once the current block has its text.
    fn start_block(&mut self, line_num: usize, always: bool) -> Result<(), ParseError> {
        self.flush_buffer();
        let finished = self
            .current
            .as_ref()
            .is_some_and(|text| always || text.body.is_some());
        if finished {
            self.finish_current()?;
        }
        if self.current.is_none() {
            self.current = Some(TextBuilder::new(line_num));
        }
        Ok(())
    }

    fn flush_buffer(&mut self) {
        self.in_body = false;
        if self.buffer.is_empty() {
            return;
        }
        let content = self.buffer.join("\n");
        self.buffer.clear();
        if let Some(text) = self.current.as_mut() {
            text.body = Some(content);
        }
    }

    fn finish_current(&mut self) -> Result<(), ParseError> {
        let Some(builder) = self.current.take() else {
            return Ok(());
        };
        let line = builder.start_line;
        let text = builder.build()?;
        if !self.seen_ids.insert(text.id.clone()) {
            return Err(ParseError::DuplicateId { id: text.id, line });
        }
        self.texts.push(text);
        Ok(())
    }

    fn finalize(mut self) -> Result<Vec<SourceText>, ParseError> {
        self.flush_buffer();
        self.finish_current()?;
        Ok(self.texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_single_text() {
        let texts = parse_pack("ID: a\nTopic: comida\nTier: basic\nText: El niño come.").unwrap();
        assert_eq!(
            texts,
            vec![SourceText {
                id: "a".into(),
                topic: Some("comida".into()),
                tier: Some(DifficultyTier::Basic),
                body: "El niño come.".into(),
            }]
        );
    }

    #[test]
    fn body_keeps_paragraph_breaks() {
        let input = "ID: a\nText: Primera frase.\nSegunda frase.\n\nOtro párrafo.\n\nID: b\nText: Hola.";
        let texts = parse_pack(input).unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].body, "Primera frase.\nSegunda frase.\n\nOtro párrafo.");
        assert_eq!(texts[1].id, "b");
    }

    #[test]
    fn ids_default_to_the_block_line() {
        let texts = parse_pack("Text: Uno.\nTopic: x\nText: Dos.").unwrap();
        assert_eq!(texts[0].id, "text-1");
        assert_eq!(texts[1].id, "text-2");
        assert_eq!(texts[1].topic.as_deref(), Some("x"));
    }

    #[test]
    fn errors_carry_line_numbers() {
        assert_eq!(
            parse_pack("ID: a\nTier: hard\nText: x"),
            Err(ParseError::InvalidTier {
                line: 2,
                value: "hard".into()
            })
        );
        assert_eq!(
            parse_pack("ID: a\nTopic: x\n\nID: b\nText: y"),
            Err(ParseError::MissingText { line: 1 })
        );
        assert_eq!(
            parse_pack("ID: a\nText: x\nID: a\nText: y"),
            Err(ParseError::DuplicateId {
                id: "a".into(),
                line: 3
            })
        );
        assert_eq!(parse_pack("\n\n"), Err(ParseError::EmptyPack));
    }
}

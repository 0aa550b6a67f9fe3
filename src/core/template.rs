//! Format compiler
//!
//! A format spec is two newline-separated segments: a printf-style layout
//! with one placeholder per field, and a comma-separated list of field
//! names, e.g. `"%s [%6s] %s\nname, levelname, message"`.
//!
//! Placeholders take the shape `%[flags][width][.precision]verb`:
//! - flags: `-` left-aligns, `0` zero-pads numbers, `+` signs numbers
//! - verbs: `s` (string), `d` (integer), `v` (natural form)
//! - `%%` renders a literal percent sign

use super::error::{LoggerError, Result};
use super::field::{Field, FieldValue, RenderContext};
use super::record::Record;
use std::fmt;

/// Logger name, level name, render time and message
pub const BASIC_FORMAT: &str = "%s [%6s] %30s - %s\n name, levelname, asctime, message";

/// Basic fields plus sequence id, thread and call-site location
pub const RICH_FORMAT: &str = "%s [%6s] %d %30s - %d - %s:%s:%d - %s\n name, levelname, seqid, asctime, thread, filename, funcname, lineno, message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Str,
    Int,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    left_align: bool,
    zero_pad: bool,
    plus_sign: bool,
    width: Option<usize>,
    precision: Option<usize>,
    verb: Verb,
}

impl Placeholder {
    fn write(&self, value: &FieldValue, out: &mut String) {
        let numeric = value.is_numeric() && self.verb != Verb::Str;

        let mut body = value.to_string();
        if numeric && self.plus_sign && !body.starts_with('-') {
            body.insert(0, '+');
        }
        if !numeric {
            if let Some(precision) = self.precision {
                if let Some((idx, _)) = body.char_indices().nth(precision) {
                    body.truncate(idx);
                }
            }
        }

        let len = body.chars().count();
        let pad = self.width.map_or(0, |width| width.saturating_sub(len));
        if pad == 0 {
            out.push_str(&body);
        } else if self.left_align {
            out.push_str(&body);
            out.extend(std::iter::repeat(' ').take(pad));
        } else if self.zero_pad && numeric {
            let digits = match body.strip_prefix(['-', '+']) {
                Some(rest) => {
                    out.push_str(&body[..1]);
                    rest
                }
                None => body.as_str(),
            };
            out.extend(std::iter::repeat('0').take(pad));
            out.push_str(digits);
        } else {
            out.extend(std::iter::repeat(' ').take(pad));
            out.push_str(&body);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A validated, ready-to-render format
///
/// # Example
///
/// ```
/// use formatted_logger::Template;
///
/// let template = Template::compile("%s - %s\nname, message").unwrap();
/// assert_eq!(template.field_names(), vec!["name", "message"]);
///
/// assert!(Template::compile("%s\nno_such_field").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    layout: String,
    segments: Vec<Segment>,
    fields: Vec<Field>,
}

impl Template {
    /// Compile a two-line format spec
    pub fn compile(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split('\n').collect();
        if parts.len() != 2 {
            return Err(LoggerError::format(format!(
                "expected a layout and a field list on two lines, found {} line(s)",
                parts.len()
            )));
        }
        let (layout, field_list) = (parts[0], parts[1]);

        let fields = if field_list.trim().is_empty() {
            Vec::new()
        } else {
            field_list
                .split(',')
                .map(|name| {
                    let name = name.trim();
                    Field::from_name(name).ok_or_else(|| LoggerError::unknown_field(name))
                })
                .collect::<Result<Vec<Field>>>()?
        };

        let segments = Self::parse_layout(layout)?;
        let placeholders = segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Placeholder(_)))
            .count();
        if placeholders != fields.len() {
            return Err(LoggerError::format(format!(
                "layout has {} placeholder(s) but {} field(s) are listed",
                placeholders,
                fields.len()
            )));
        }

        Ok(Self {
            source: spec.to_string(),
            layout: layout.to_string(),
            segments,
            fields,
        })
    }

    fn parse_layout(layout: &str) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = layout.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if let Some((_, '%')) = chars.peek() {
                chars.next();
                literal.push('%');
                continue;
            }

            let mut placeholder = Placeholder {
                left_align: false,
                zero_pad: false,
                plus_sign: false,
                width: None,
                precision: None,
                verb: Verb::Value,
            };

            while let Some(&(_, flag)) = chars.peek() {
                match flag {
                    '-' => placeholder.left_align = true,
                    '0' => placeholder.zero_pad = true,
                    '+' => placeholder.plus_sign = true,
                    _ => break,
                }
                chars.next();
            }

            placeholder.width = Self::parse_number(&mut chars);
            if let Some((_, '.')) = chars.peek() {
                chars.next();
                placeholder.precision = Some(Self::parse_number(&mut chars).unwrap_or(0));
            }

            placeholder.verb = match chars.next() {
                Some((_, 's')) => Verb::Str,
                Some((_, 'd')) => Verb::Int,
                Some((_, 'v')) => Verb::Value,
                Some((_, other)) => {
                    return Err(LoggerError::format(format!(
                        "unsupported verb '%{}' at byte {}",
                        other, pos
                    )))
                }
                None => {
                    return Err(LoggerError::format(format!(
                        "dangling '%' at byte {}",
                        pos
                    )))
                }
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(placeholder));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(segments)
    }

    fn parse_number(
        chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    ) -> Option<usize> {
        let mut value: Option<usize> = None;
        while let Some(&(_, c)) = chars.peek() {
            let Some(digit) = c.to_digit(10) else { break };
            value = Some(
                value
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(digit as usize),
            );
            chars.next();
        }
        value
    }

    /// Render `record` into one line (without the trailing newline)
    pub fn render(&self, ctx: &RenderContext<'_>, record: &mut Record) -> String {
        let mut out = String::with_capacity(self.layout.len() + record.message().len() + 32);
        let mut fields = self.fields.iter();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => {
                    // compile() guarantees one field per placeholder
                    if let Some(field) = fields.next() {
                        let value = field.resolve(ctx, record);
                        placeholder.write(&value, &mut out);
                    }
                }
            }
        }
        out
    }

    /// The format spec this template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The layout line
    pub fn layout(&self) -> &str {
        &self.layout
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.as_str()).collect()
    }
}

impl std::str::FromStr for Template {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Template::compile(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

//! The path subset understood by the query facade.
//!
//! Grammar: an optional `./`, `.//` or `//` anchor followed by steps joined by
//! `/` (child) or `//` (descendant). A step is `*` or `[prefix:]Name`, with any
//! number of `[@[prefix:]Attr='value']` equality predicates. A trailing `/`
//! selects all element children of the previous step.

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    fn parse(path: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (prefix, local) = match raw.split_once(':') {
            Some((prefix, local)) => (Some(prefix.to_string()), local),
            None => (None, raw),
        };
        if local.is_empty() || !local.chars().all(is_name_char) {
            return Err(IngestError::invalid_path(
                path,
                format!("invalid name '{raw}'"),
            ));
        }
        if prefix.as_deref().is_some_and(|p| p.is_empty() || !p.chars().all(is_name_char)) {
            return Err(IngestError::invalid_path(
                path,
                format!("invalid prefix in '{raw}'"),
            ));
        }
        Ok(Self {
            prefix,
            local: local.to_string(),
        })
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    Any,
    Name(QName),
}

/// `[@attribute='value']`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub attribute: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub axis: Axis,
    pub name: NameTest,
    pub predicates: Vec<Predicate>,
}

/// A parsed query path, evaluated relative to the document root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPath {
    pub source: String,
    pub steps: Vec<Step>,
}

impl QueryPath {
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        let (mut axis, mut rest) = if let Some(rest) = trimmed.strip_prefix(".//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = trimmed.strip_prefix("//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = trimmed.strip_prefix("./") {
            (Axis::Child, rest)
        } else {
            (Axis::Child, trimmed)
        };
        if rest.is_empty() {
            return Err(IngestError::invalid_path(path, "empty path"));
        }

        let mut steps = Vec::new();
        loop {
            let (step, remaining) = parse_step(path, axis, rest)?;
            steps.push(step);
            rest = remaining;
            if rest.is_empty() {
                break;
            }
            if let Some(next) = rest.strip_prefix("//") {
                axis = Axis::Descendant;
                rest = next;
            } else if let Some(next) = rest.strip_prefix('/') {
                axis = Axis::Child;
                rest = next;
            } else {
                return Err(IngestError::invalid_path(
                    path,
                    format!("unexpected '{rest}'"),
                ));
            }
            if rest.is_empty() {
                if axis == Axis::Descendant {
                    return Err(IngestError::invalid_path(path, "trailing '//'"));
                }
                steps.push(Step {
                    axis: Axis::Child,
                    name: NameTest::Any,
                    predicates: Vec::new(),
                });
                break;
            }
        }

        Ok(Self {
            source: path.to_string(),
            steps,
        })
    }

    /// Every namespace prefix the path refers to.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flat_map(|step| {
            let name = match &step.name {
                NameTest::Name(qname) => qname.prefix.as_deref(),
                NameTest::Any => None,
            };
            name.into_iter().chain(
                step.predicates
                    .iter()
                    .filter_map(|predicate| predicate.attribute.prefix.as_deref()),
            )
        })
    }
}

fn parse_step<'p>(path: &str, axis: Axis, input: &'p str) -> Result<(Step, &'p str)> {
    let end = input.find(['/', '[']).unwrap_or(input.len());
    let raw_name = &input[..end];
    let name = if raw_name == "*" {
        NameTest::Any
    } else {
        NameTest::Name(QName::parse(path, raw_name)?)
    };

    let mut rest = &input[end..];
    let mut predicates = Vec::new();
    while let Some(body) = rest.strip_prefix('[') {
        let (predicate, remaining) = parse_predicate(path, body)?;
        predicates.push(predicate);
        rest = remaining;
    }

    Ok((
        Step {
            axis,
            name,
            predicates,
        },
        rest,
    ))
}

/// Parses `@name='value']`, returning the text after the closing bracket.
fn parse_predicate<'p>(path: &str, input: &'p str) -> Result<(Predicate, &'p str)> {
    let body = input.strip_prefix('@').ok_or_else(|| {
        IngestError::invalid_path(path, "only [@attr='value'] predicates are supported")
    })?;
    let (raw_name, after_eq) = body
        .split_once('=')
        .ok_or_else(|| IngestError::invalid_path(path, "predicate without '='"))?;
    let after_eq = after_eq.trim_start();
    let quote = after_eq
        .chars()
        .next()
        .filter(|ch| matches!(ch, '\'' | '"'))
        .ok_or_else(|| IngestError::invalid_path(path, "predicate value must be quoted"))?;
    let quoted = &after_eq[1..];
    let close = quoted
        .find(quote)
        .ok_or_else(|| IngestError::invalid_path(path, "unterminated predicate value"))?;
    let value = &quoted[..close];
    let rest = quoted[close + 1..]
        .trim_start()
        .strip_prefix(']')
        .ok_or_else(|| IngestError::invalid_path(path, "predicate without closing ']'"))?;

    Ok((
        Predicate {
            attribute: QName::parse(path, raw_name)?,
            value: value.to_string(),
        },
        rest,
    ))
}

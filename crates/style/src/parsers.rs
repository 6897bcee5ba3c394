//! Low-level nom parser functions for measurement values.
//!
//! Directive attributes arrive as loosely typed strings (`"100pt"`, `"1in"`,
//! `"2.5 cm"`, `"50%"`). Everything is normalised to points.

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till, take_while, take_while1};
use nom::character::complete::{char, digit1, space0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::{IResult, Parser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing a measurement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Value '{0}' is not a finite number")]
    NotFinite(String),
}

/// Units accepted in measurement strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pt,
    Px,
    Pc,
    In,
    Cm,
    Mm,
}

impl Unit {
    pub fn points_per_unit(self) -> f32 {
        match self {
            Unit::Pt | Unit::Px => 1.0,
            Unit::Pc => 12.0,
            Unit::In => 72.0,
            Unit::Cm => 72.0 / 2.54,
            Unit::Mm => 72.0 / 25.4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Pt => "pt",
            Unit::Px => "px",
            Unit::Pc => "pc",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
        }
    }
}

/// A measurement that may be relative to its reference area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Pt(f32),
    Percent(f32),
    #[default]
    Auto,
}

impl Dimension {
    /// Resolves against a reference length. `Auto` yields `None`.
    pub fn resolve(self, reference: f32) -> Option<f32> {
        match self {
            Dimension::Pt(v) => Some(v),
            Dimension::Percent(p) => Some(reference * p / 100.0),
            Dimension::Auto => None,
        }
    }
}

// --- Primitive parsers ---

fn parse_number(input: &str) -> IResult<&str, f32> {
    map_res(
        recognize((
            opt(alt((char('+'), char('-')))),
            alt((
                recognize((digit1, opt((char('.'), opt(digit1))))),
                recognize((char('.'), digit1)),
            )),
        )),
        |s: &str| s.parse::<f32>(),
    )
    .parse(input)
}

fn parse_unit(input: &str) -> IResult<&str, Unit> {
    alt((
        value(Unit::Pt, tag_no_case("pt")),
        value(Unit::Px, tag_no_case("px")),
        value(Unit::Pc, tag_no_case("pc")),
        value(Unit::In, tag_no_case("in")),
        value(Unit::Cm, tag_no_case("cm")),
        value(Unit::Mm, tag_no_case("mm")),
    ))
    .parse(input)
}

/// Parses a length with an optional unit; a bare number is taken as points.
pub fn parse_length(input: &str) -> IResult<&str, f32> {
    let (input, number) = parse_number(input)?;
    let (input, unit) = opt(preceded(space0, parse_unit)).parse(input)?;
    Ok((input, number * unit.map(Unit::points_per_unit).unwrap_or(1.0)))
}

/// Parses a length, a percentage or the keyword `auto`.
pub fn parse_dimension(input: &str) -> IResult<&str, Dimension> {
    alt((
        value(Dimension::Auto, tag_no_case("auto")),
        map((parse_number, preceded(space0, tag("%"))), |(p, _)| {
            Dimension::Percent(p)
        }),
        map(parse_length, Dimension::Pt),
    ))
    .parse(input)
}

/// Runs a parser over the whole (trimmed) input.
pub fn run_parser<'a, T, P>(parser: P, input: &'a str) -> Result<T, StyleParseError>
where
    P: Parser<&'a str, Output = T, Error = nom::error::Error<&'a str>>,
{
    all_consuming(delimited(space0, parser, space0))
        .parse(input)
        .map(|(_, out)| out)
        .map_err(|e| StyleParseError::Parse(format!("'{}': {}", input, e)))
}

/// Parses a length string into points.
pub fn parse_length_str(input: &str) -> Result<f32, StyleParseError> {
    let value = run_parser(parse_length, input)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StyleParseError::NotFinite(input.to_string()))
    }
}

pub fn parse_dimension_str(input: &str) -> Result<Dimension, StyleParseError> {
    let dim = run_parser(parse_dimension, input)?;
    match dim {
        Dimension::Pt(v) | Dimension::Percent(v) if !v.is_finite() => {
            Err(StyleParseError::NotFinite(input.to_string()))
        }
        other => Ok(other),
    }
}

/// Defensive variant: anything unparseable or non-finite is simply absent.
pub fn lenient_length(input: &str) -> Option<f32> {
    parse_length_str(input).ok()
}

// --- key=value attribute lists ---

fn attr_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-').parse(input)
}

fn attr_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c| c == '"'), char('"')),
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
        take_till(|c: char| c.is_whitespace() || c == ',' || c == ';'),
    ))
    .parse(input)
}

fn attr_separator(input: &str) -> IResult<&str, ()> {
    value((), take_while(|c: char| c.is_whitespace() || c == ',' || c == ';')).parse(input)
}

fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(attr_key, delimited(space0, char('='), space0), attr_value).parse(input)
}

/// Parses `key=value` pairs separated by whitespace, commas or semicolons.
/// Values may be single- or double-quoted. Keys are lowercased.
pub fn parse_attributes(input: &str) -> Result<Vec<(String, String)>, StyleParseError> {
    let attrs = all_consuming(terminated(
        many0(preceded(attr_separator, attribute)),
        attr_separator,
    ))
    .parse(input)
    .map(|(_, out)| out)
    .map_err(|e| StyleParseError::Parse(format!("'{}': {}", input, e)))?;

    Ok(attrs
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect())
}

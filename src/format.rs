//! Display formatting for table cells.
//!
//! Format rules are written as templates in the familiar `{:,.2f}` style: an
//! optional literal prefix and suffix around one replacement field whose spec
//! follows `[[fill]align][sign][0][width][,|_][.precision][type]`. Templates
//! are parsed once at table construction and checked against the column's
//! type so that a bad rule fails there instead of on every paint.

use std::borrow::Cow;

use polars::prelude::{AnyValue, DataType};
use regex::Regex;

use crate::schema::{is_float_type, is_integer_type, is_numeric_type};

const SPEC_PATTERN: &str = concat!(
    r"^(?:(?P<fill>.)?(?P<align>[<>=^]))?(?P<sign>[+\- ])?(?P<zero>0)?(?P<width>\d+)?",
    r"(?P<group>[,_])?(?:\.(?P<precision>\d+))?(?P<kind>[dfFeEs%])?$",
);

const DEFAULT_PRECISION: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits.
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Negative,
    Always,
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    General,
    Decimal,
    Fixed { upper: bool },
    Exponent { upper: bool },
    Percent,
    Text,
}

/// A parsed format template.
#[derive(Debug, Clone, PartialEq)]
pub struct CellFormat {
    template: String,
    prefix: String,
    suffix: String,
    fill: char,
    align: Option<Align>,
    sign: Sign,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Kind,
}

enum Scalar<'a> {
    Int(i128),
    /// The flag marks values read from an `f32` column.
    Float(f64, bool),
    Text(Cow<'a, str>),
    Missing,
}

impl CellFormat {
    /// Plain `{}` conversion.
    pub fn plain() -> Self {
        Self {
            template: "{}".to_string(),
            prefix: String::new(),
            suffix: String::new(),
            fill: ' ',
            align: None,
            sign: Sign::Negative,
            width: 0,
            grouping: None,
            precision: None,
            kind: Kind::General,
        }
    }

    /// Type-driven default for a column of `dtype`.
    ///
    /// Floats get `precision` fractional digits, integers no fraction, both
    /// with thousands separators when `grouping` is set. Anything else uses
    /// the plain conversion.
    pub fn default_for(dtype: &DataType, precision: usize, grouping: bool) -> Self {
        let separator = grouping.then_some(',');
        let sep = if grouping { "," } else { "" };
        if is_float_type(dtype) {
            Self {
                template: format!("{{:{sep}.{precision}f}}"),
                grouping: separator,
                precision: Some(precision),
                kind: Kind::Fixed { upper: false },
                ..Self::plain()
            }
        } else if is_integer_type(dtype) {
            Self {
                template: format!("{{:{sep}d}}"),
                grouping: separator,
                kind: Kind::Decimal,
                ..Self::plain()
            }
        } else {
            Self::plain()
        }
    }

    /// Parse a template such as `"{:,.2f}"` or `"$ {:>12,.0f}"`.
    ///
    /// `{{` and `}}` stand for literal braces. Exactly one replacement field
    /// is required; it may carry a positional `0` before the colon.
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut field: Option<String> = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            let literal = match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    '{'
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    '}'
                }
                '{' => {
                    if field.is_some() {
                        return Err("only one replacement field is supported".to_string());
                    }
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err("unterminated replacement field".to_string());
                    }
                    field = Some(inner);
                    continue;
                }
                '}' => return Err("single '}' encountered".to_string()),
                other => other,
            };
            if field.is_some() {
                suffix.push(literal);
            } else {
                prefix.push(literal);
            }
        }

        let field = field.ok_or_else(|| "no replacement field".to_string())?;
        let spec = match field.split_once(':') {
            Some(("" | "0", spec)) => spec,
            Some((arg, _)) => return Err(format!("unsupported field argument '{arg}'")),
            None if field.is_empty() || field == "0" => "",
            None => return Err(format!("unsupported field argument '{field}'")),
        };

        let mut format = Self::parse_spec(spec)?;
        format.template = template.to_string();
        format.prefix = prefix;
        format.suffix = suffix;
        Ok(format)
    }

    fn parse_spec(spec: &str) -> Result<Self, String> {
        let re = Regex::new(SPEC_PATTERN).map_err(|e| e.to_string())?;
        let caps = re
            .captures(spec)
            .ok_or_else(|| format!("cannot parse format spec '{spec}'"))?;

        let align = caps.name("align").map(|m| match m.as_str() {
            "<" => Align::Left,
            ">" => Align::Right,
            "^" => Align::Center,
            _ => Align::AfterSign,
        });
        let fill = caps
            .name("fill")
            .and_then(|m| m.as_str().chars().next());
        let sign = match caps.name("sign").map(|m| m.as_str()) {
            Some("+") => Sign::Always,
            Some(" ") => Sign::Space,
            _ => Sign::Negative,
        };
        let zero = caps.name("zero").is_some();
        let width = match caps.name("width") {
            Some(m) => m
                .as_str()
                .parse::<usize>()
                .map_err(|e| format!("bad width: {e}"))?,
            None => 0,
        };
        let precision = match caps.name("precision") {
            Some(m) => Some(
                m.as_str()
                    .parse::<usize>()
                    .map_err(|e| format!("bad precision: {e}"))?,
            ),
            None => None,
        };
        let kind = match caps.name("kind").map(|m| m.as_str()) {
            Some("d") => Kind::Decimal,
            Some("f") => Kind::Fixed { upper: false },
            Some("F") => Kind::Fixed { upper: true },
            Some("e") => Kind::Exponent { upper: false },
            Some("E") => Kind::Exponent { upper: true },
            Some("%") => Kind::Percent,
            Some("s") => Kind::Text,
            _ => Kind::General,
        };

        if kind == Kind::Decimal && precision.is_some() {
            return Err("precision not allowed with 'd'".to_string());
        }

        let (fill, align) = match (fill, align) {
            (_, Some(a)) => (fill.unwrap_or(' '), Some(a)),
            (_, None) if zero => ('0', Some(Align::AfterSign)),
            _ => (' ', None),
        };

        Ok(Self {
            template: String::new(),
            prefix: String::new(),
            suffix: String::new(),
            fill,
            align,
            sign,
            width,
            grouping: caps.name("group").and_then(|m| m.as_str().chars().next()),
            precision,
            kind,
        })
    }

    /// The template this format was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Check that this format can render values of `dtype`.
    pub fn check_dtype(&self, dtype: &DataType) -> Result<(), String> {
        let numeric = is_numeric_type(dtype);
        let textual = matches!(dtype, DataType::String);
        match self.kind {
            Kind::Decimal if !is_integer_type(dtype) => {
                Err(format!("'d' needs an integer column, got {dtype}"))
            }
            Kind::Fixed { .. } | Kind::Exponent { .. } | Kind::Percent if !numeric => {
                Err(format!("numeric format applied to {dtype} column"))
            }
            Kind::Text if !textual => Err(format!("'s' needs a string column, got {dtype}")),
            Kind::General if self.precision.is_some() && numeric => Err(
                "precision without a presentation type is only supported for strings".to_string(),
            ),
            _ if textual && self.grouping.is_some() => {
                Err("thousands separator not allowed for strings".to_string())
            }
            _ if textual
                && (self.sign != Sign::Negative || self.align == Some(Align::AfterSign)) =>
            {
                Err("sign options not allowed for strings".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Render a cell value. Nulls render as an empty string.
    pub fn render(&self, value: &AnyValue) -> String {
        let body = match scalar(value) {
            Scalar::Missing => return String::new(),
            Scalar::Int(i) => self.render_int(i),
            Scalar::Float(f, single) => self.render_float(f, single),
            Scalar::Text(s) => self.render_text(&s),
        };
        if self.prefix.is_empty() && self.suffix.is_empty() {
            body
        } else {
            format!("{}{}{}", self.prefix, body, self.suffix)
        }
    }

    fn render_int(&self, value: i128) -> String {
        match self.kind {
            Kind::General | Kind::Decimal | Kind::Text => {
                let digits = group_digits(&value.unsigned_abs().to_string(), self.grouping);
                self.pad_number(value < 0, digits)
            }
            _ => self.render_float(value as f64, false),
        }
    }

    fn render_float(&self, value: f64, single: bool) -> String {
        let negative = value.is_sign_negative() && !value.is_nan();
        let abs = value.abs();
        let body = match self.kind {
            Kind::Fixed { upper } => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                non_finite(abs, upper).unwrap_or_else(|| {
                    group_fraction(&format!("{:.*}", p, abs), self.grouping)
                })
            }
            Kind::Exponent { upper } => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                non_finite(abs, upper).unwrap_or_else(|| exponent(abs, p, upper))
            }
            Kind::Percent => {
                let p = self.precision.unwrap_or(DEFAULT_PRECISION);
                non_finite(abs, false).map(|s| format!("{s}%")).unwrap_or_else(|| {
                    format!(
                        "{}%",
                        group_fraction(&format!("{:.*}", p, abs * 100.0), self.grouping)
                    )
                })
            }
            Kind::Decimal => group_digits(&format!("{:.0}", abs.trunc()), self.grouping),
            Kind::General | Kind::Text => non_finite(abs, false)
                .unwrap_or_else(|| group_fraction(&shortest(abs, single), self.grouping)),
        };
        self.pad_number(negative, body)
    }

    fn render_text(&self, value: &str) -> String {
        let text: Cow<str> = match self.precision {
            Some(p) => Cow::Owned(value.chars().take(p).collect()),
            None => Cow::Borrowed(value),
        };
        self.pad("", &text, Align::Left)
    }

    fn pad_number(&self, negative: bool, digits: String) -> String {
        let sign = if negative {
            "-"
        } else {
            match self.sign {
                Sign::Always => "+",
                Sign::Space => " ",
                Sign::Negative => "",
            }
        };
        self.pad(sign, &digits, Align::Right)
    }

    fn pad(&self, sign: &str, body: &str, default_align: Align) -> String {
        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{sign}{body}");
        }
        let fill_by = |n: usize| self.fill.to_string().repeat(n);
        let gap = self.width - len;
        match self.align.unwrap_or(default_align) {
            Align::Left => format!("{sign}{body}{}", fill_by(gap)),
            Align::Right => format!("{}{sign}{body}", fill_by(gap)),
            Align::Center => {
                let left = gap / 2;
                format!("{}{sign}{body}{}", fill_by(left), fill_by(gap - left))
            }
            Align::AfterSign => format!("{sign}{}{body}", fill_by(gap)),
        }
    }
}

fn scalar<'a>(value: &'a AnyValue) -> Scalar<'a> {
    match value {
        AnyValue::Null => Scalar::Missing,
        AnyValue::Int8(v) => Scalar::Int(*v as i128),
        AnyValue::Int16(v) => Scalar::Int(*v as i128),
        AnyValue::Int32(v) => Scalar::Int(*v as i128),
        AnyValue::Int64(v) => Scalar::Int(*v as i128),
        AnyValue::UInt8(v) => Scalar::Int(*v as i128),
        AnyValue::UInt16(v) => Scalar::Int(*v as i128),
        AnyValue::UInt32(v) => Scalar::Int(*v as i128),
        AnyValue::UInt64(v) => Scalar::Int(*v as i128),
        AnyValue::Float32(v) => Scalar::Float(*v as f64, true),
        AnyValue::Float64(v) => Scalar::Float(*v, false),
        AnyValue::String(s) => Scalar::Text(Cow::Borrowed(s)),
        other => Scalar::Text(other.str_value()),
    }
}

/// The value as `f64` if it is an integer or float.
pub(crate) fn numeric_value(value: &AnyValue) -> Option<f64> {
    match scalar(value) {
        Scalar::Int(i) => Some(i as f64),
        Scalar::Float(f, _) => Some(f),
        Scalar::Missing | Scalar::Text(_) => None,
    }
}

fn non_finite(abs: f64, upper: bool) -> Option<String> {
    let s = if abs.is_nan() {
        "nan"
    } else if abs.is_infinite() {
        "inf"
    } else {
        return None;
    };
    Some(if upper { s.to_uppercase() } else { s.to_string() })
}

/// Shortest round-trip text, with a trailing `.0` for integral values and
/// scientific notation outside `[1e-4, 1e16)`. Single precision values are
/// printed at their own width so `0.1f32` stays `0.1`.
fn shortest(abs: f64, single: bool) -> String {
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let raw = if single { format!("{:e}", abs as f32) } else { format!("{abs:e}") };
        let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        return format!("{}e{}{:02}", mantissa, if exp < 0 { '-' } else { '+' }, exp.abs());
    }
    let s = if single { (abs as f32).to_string() } else { abs.to_string() };
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

fn exponent(abs: f64, precision: usize, upper: bool) -> String {
    let raw = format!("{:.*e}", precision, abs);
    let (mantissa, exp) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    format!(
        "{}{}{}{:02}",
        mantissa,
        if upper { 'E' } else { 'e' },
        if exp < 0 { '-' } else { '+' },
        exp.abs()
    )
}

/// Insert `separator` every three digits from the right.
fn group_digits(digits: &str, separator: Option<char>) -> String {
    let Some(sep) = separator else {
        return digits.to_string();
    };
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Group the integer part of a plain decimal string, leaving the rest alone.
fn group_fraction(number: &str, separator: Option<char>) -> String {
    if separator.is_none() {
        return number.to_string();
    }
    let split = number
        .find(|c| c == '.' || c == 'e')
        .unwrap_or(number.len());
    let (int_part, rest) = number.split_at(split);
    format!("{}{}", group_digits(int_part, separator), rest)
}

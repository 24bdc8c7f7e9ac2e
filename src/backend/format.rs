//! Java-style format strings for `write`/`writeln`.
//!
//! All three backends share one format string per write statement: the
//! interpreter and the reference machine render it with [`render`], the
//! converter hands it to `System.out.printf`, the compiler pushes it as a
//! constant for the external `Printf` call.

use lazy_static::lazy_static;
use regex::Regex;
use sprintf::{vsprintf, Printf};

use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::{Literal, NodeId, NodeKind},
    errors::errors::Error,
    symtab::value::Value,
    types::types::TypeId,
};

lazy_static! {
    static ref SPECIFIER: Regex = Regex::new(r"%(-)?(\d+)?(?:\.(\d+))?([dfbcs%])").unwrap();
}

/// Format string of one write statement plus the expressions filling its
/// specifiers, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFormat {
    pub format: String,
    pub args: Vec<NodeId>,
}

/// Conversion flag selected by the base type of a printed expression.
pub fn conversion_flag(analysis: &Analysis, ty: TypeId) -> Result<char, Error> {
    let base = analysis.types.strip_subrange(ty);
    match base {
        TypeId::INTEGER => Ok('d'),
        TypeId::REAL => Ok('f'),
        TypeId::BOOLEAN => Ok('b'),
        TypeId::CHAR => Ok('c'),
        TypeId::STRING => Ok('s'),
        _ if analysis.types.is_enumeration(base) => Ok('d'),
        _ => Err(Error::internal(
            format!("cannot print a value of type {}", analysis.types.type_name(ty)),
            0,
        )),
    }
}

pub fn build_format(analysis: &Analysis, write: NodeId) -> Result<WriteFormat, Error> {
    let tree = &analysis.tree;
    let mut format = String::new();
    let mut args = vec![];

    for arg in tree.children(write) {
        let children = tree.children(*arg);
        let expr = *children
            .first()
            .ok_or_else(|| Error::internal("empty write argument", tree.line(*arg)))?;

        let width = match children.get(1) {
            Some(node) => integer_constant(analysis, *node)?,
            None => None,
        };
        let precision = match children.get(2) {
            Some(node) => integer_constant(analysis, *node)?,
            None => None,
        };

        let inline_text = match tree.literal(expr) {
            Some(Literal::Str(text)) if tree.kind(expr) == NodeKind::Literal => Some(text.clone()),
            Some(Literal::Char(c)) if tree.kind(expr) == NodeKind::Literal => Some(c.to_string()),
            _ => None,
        };
        if let (Some(text), None) = (&inline_text, width) {
            format.push_str(&text.replace('%', "%%"));
            continue;
        }

        format.push('%');
        if let Some(width) = width.filter(|width| *width != 0) {
            if width < 0 {
                format.push('-');
            }
            format.push_str(&width.abs().to_string());
        }
        let flag = conversion_flag(analysis, analysis.type_at(expr)?)?;
        if let (Some(precision), 'f') = (precision, flag) {
            format.push_str(&format!(".{}", precision.max(0)));
        }
        format.push(flag);
        args.push(expr);
    }

    if let NodeKind::Write { newline: true } = tree.kind(write) {
        format.push('\n');
    }

    Ok(WriteFormat { format, args })
}

fn integer_constant(analysis: &Analysis, node: NodeId) -> Result<Option<i64>, Error> {
    match analysis.constant_at(node)? {
        Value::Integer(value) => Ok(Some(value as i64)),
        other => Err(Error::internal(
            format!("format specifier {} is not an integer", other),
            analysis.tree.line(node),
        )),
    }
}

/// Renders a Java-style format string. `%b` and `%c` are rendered through
/// `%s` with the value's Java spelling.
pub fn render(format: &str, values: &[Value]) -> Result<String, Error> {
    let mut result = String::new();
    let mut values = values.iter();
    let mut last = 0;

    for captures in SPECIFIER.captures_iter(format) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        result.push_str(&format[last..whole.start()]);
        last = whole.end();

        let flag = captures.get(4).map_or("s", |m| m.as_str());
        if flag == "%" {
            result.push('%');
            continue;
        }

        let value = values
            .next()
            .ok_or_else(|| Error::internal(format!("no value for `{}`", whole.as_str()), 0))?;
        let mut spec = String::from("%");
        if captures.get(1).is_some() {
            spec.push('-');
        }
        if let Some(width) = captures.get(2) {
            spec.push_str(width.as_str());
        }
        if let Some(precision) = captures.get(3) {
            spec.push('.');
            spec.push_str(precision.as_str());
        }

        let rendered = match (flag, value) {
            ("d", Value::Integer(value)) => printf(&spec, 'd', value),
            ("f", value) => match value.as_real() {
                Some(real) => printf(&spec, 'f', &real),
                None => Err(mismatched(flag, value)),
            },
            ("b", Value::Boolean(value)) => printf(&spec, 's', &value.to_string()),
            ("c", Value::Char(value)) => printf(&spec, 's', &value.to_string()),
            ("s", Value::Str(value)) => printf(&spec, 's', value),
            ("s", Value::Char(value)) => printf(&spec, 's', &value.to_string()),
            (flag, value) => Err(mismatched(flag, value)),
        }?;
        result.push_str(&rendered);
    }

    result.push_str(&format[last..]);
    Ok(result)
}

fn printf(spec: &str, flag: char, value: &dyn Printf) -> Result<String, Error> {
    let spec = format!("{}{}", spec, flag);
    vsprintf(&spec, &[value])
        .map_err(|error| Error::internal(format!("cannot render `{}`: {:?}", spec, error), 0))
}

fn mismatched(flag: &str, value: &Value) -> Error {
    Error::internal(format!("`%{}` cannot print {}", flag, value), 0)
}

#![allow(clippy::module_inception)]

use crate::errors::errors::{Error, ErrorTip};

pub mod analyzer;
pub mod ast;
pub mod backend;
pub mod compiler;
pub mod converter;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod symtab;
pub mod types;

extern crate regex;

/// Text of a 1-based source line, without its line break.
pub fn get_line_text(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source
        .split('\n')
        .nth(line as usize - 1)
        .map(|text| text.trim_end_matches('\r'))
}

#[cfg(test)]
mod tests {
    const SOURCE: &str = "program p;\n  var a: integer;\r\nbegin\nend.";

    #[test]
    fn test_get_line_text() {
        assert_eq!(super::get_line_text(SOURCE, 1), Some("program p;"));
        assert_eq!(super::get_line_text(SOURCE, 2), Some("  var a: integer;"));
        assert_eq!(super::get_line_text(SOURCE, 4), Some("end."));
        assert_eq!(super::get_line_text(SOURCE, 5), None);
        assert_eq!(super::get_line_text(SOURCE, 0), None);
    }

    #[test]
    fn test_format_error() {
        let error = crate::errors::errors::Error::new(
            crate::errors::errors::ErrorImpl::UndeclaredIdentifier {
                name: "b".to_string(),
            },
            2,
        );
        let text = super::format_error(&error, SOURCE, "p.pas");

        assert_eq!(
            text,
            "Error: UndeclaredIdentifier (`b` is not declared)\n-> p.pas\n  |\n2 | var a: integer;\n"
        );
    }
}

/// Renders an error with the offending source line.
///
/// ```text
/// Error: UndeclaredIdentifier (`b` is not declared)
/// -> hello.pas
///    |
/// 12 | b := 1;
/// ```
pub fn format_error(error: &Error, source: &str, file: &str) -> String {
    let mut text = match error.get_tip() {
        ErrorTip::None => format!("Error: {}\n", error.get_error_name()),
        tip => format!("Error: {} ({})\n", error.get_error_name(), tip),
    };
    text.push_str(&format!("-> {}\n", file));

    if let Some(line_text) = get_line_text(source, error.get_line()) {
        let line = error.get_line().to_string();
        let padding = line.len() + 2;
        text.push_str(&format!("{:>padding$}\n", "|"));
        text.push_str(&format!("{} | {}\n", line, line_text.trim()));
    }

    text
}

pub fn display_error(error: &Error, source: &str, file: &str) {
    eprint!("{}", format_error(error, source, file));
}

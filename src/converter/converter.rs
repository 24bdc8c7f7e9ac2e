//! Pascal to Java source conversion.
//!
//! The program becomes one class: enumeration constants and program
//! variables are static fields, records are static nested classes with a
//! deep `copy()`, arrays are built and copied by generated factories, and
//! routines are static methods. Generated helpers are spelled with a `$`
//! so they never collide with Pascal identifiers.

use std::{collections::HashSet, fmt::Write};

use lazy_static::lazy_static;

use crate::{
    analyzer::analyzer::Analysis,
    ast::ast::NodeId,
    backend::backend::{Backend, BackendMode},
    errors::errors::{Error, ErrorImpl},
    symtab::{
        symtab::{ScopeId, SymbolId, SymbolKind},
        value::Value,
    },
    types::types::{TypeForm, TypeId},
};

lazy_static! {
    /// Java keywords plus names the generated class relies on.
    static ref JAVA_RESERVED: HashSet<&'static str> = [
        "abstract", "assert", "boolean", "break", "byte", "catch", "char", "class", "continue",
        "default", "double", "enum", "extends", "final", "finally", "float", "goto", "implements",
        "import", "instanceof", "int", "interface", "long", "native", "new", "null", "package",
        "private", "protected", "public", "return", "short", "static", "strictfp", "super",
        "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
        "volatile", "main", "string", "system", "math", "object", "scanner",
    ]
    .into_iter()
    .collect();
}

/// Java identifier for a Pascal name.
pub fn java_name(name: &str) -> String {
    if JAVA_RESERVED.contains(name.to_lowercase().as_str()) {
        format!("_{}", name)
    } else {
        name.to_string()
    }
}

/// Java literal text for a string.
pub fn string_literal(text: &str) -> String {
    let mut result = String::from("\"");
    for c in text.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

pub fn char_literal(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        c => format!("'{}'", c),
    }
}

pub fn value_literal(value: &Value) -> String {
    match value {
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => format!("{:?}", value),
        Value::Boolean(value) => value.to_string(),
        Value::Char(value) => char_literal(*value),
        Value::Str(value) => string_literal(value),
        Value::Array(_) | Value::Record(_) => "null".to_string(),
    }
}

/// Indentation-aware text sink.
#[derive(Debug, Default)]
pub struct JavaWriter {
    text: String,
    indent: usize,
}

impl JavaWriter {
    pub fn line(&mut self, line: &str) {
        let _ = writeln!(self.text, "{}{}", "    ".repeat(self.indent), line);
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    /// Writes `header {` and indents.
    pub fn open(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.indent += 1;
    }

    pub fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    pub fn finish(self) -> String {
        self.text
    }
}

pub struct Converter {
    pub out: JavaWriter,
}

impl Backend for Converter {
    type Output = String;

    fn mode(&self) -> BackendMode {
        BackendMode::Convert
    }

    fn run(self, analysis: &mut Analysis) -> Result<String, Error> {
        self.convert(analysis)
    }
}

/// Converts a clean annotated program into Java source.
pub fn convert(analysis: &Analysis) -> Result<String, Error> {
    Converter::new().convert(analysis)
}

impl Converter {
    pub fn new() -> Self {
        Converter {
            out: JavaWriter::default(),
        }
    }

    #[tracing::instrument(skip_all, name = "convert")]
    pub fn convert(mut self, analysis: &Analysis) -> Result<String, Error> {
        let program = analysis.program_entry()?;
        let scope = analysis.program_scope()?;
        let class = java_name(&analysis.symtab.entry(program).name);

        self.out.line("import java.util.Locale;");
        self.out.line("import java.util.Scanner;");
        self.out.blank();
        self.out.open(&format!("public class {}", class));
        self.out
            .line("private static final Scanner $in = new Scanner(System.in);");

        self.emit_enumerations(analysis);
        self.emit_constants(analysis, scope, "public static final ")?;
        self.emit_records(analysis)?;

        let variables = analysis.program_variables()?;
        if !variables.is_empty() {
            self.out.blank();
        }
        for variable in variables {
            let entry = analysis.symtab.entry(variable);
            self.out.line(&format!(
                "public static {} {} = {};",
                self.java_type(analysis, entry.ty)?,
                java_name(&entry.name),
                self.default_expr(analysis, entry.ty)?
            ));
        }

        self.emit_array_factories(analysis)?;
        self.emit_division_helpers();

        for routine in analysis.routines()? {
            self.out.blank();
            self.emit_routine(analysis, routine)?;
        }

        self.out.blank();
        self.out.open("public static void main(String[] args)");
        let root = analysis
            .tree
            .root()
            .ok_or_else(|| Error::internal("tree has no root", 0))?;
        self.emit_body(analysis, root)?;
        self.out.line("System.out.flush();");
        self.out.close();

        self.out.close();
        tracing::debug!(class = %class, "converted program");
        Ok(self.out.finish())
    }

    pub fn java_type(&self, analysis: &Analysis, ty: TypeId) -> Result<String, Error> {
        Ok(match analysis.types.form(ty) {
            TypeForm::Subrange { base, .. } => self.java_type(analysis, *base)?,
            TypeForm::Enumeration { .. } => "int".to_string(),
            TypeForm::Array { element, .. } => format!("{}[]", self.java_type(analysis, *element)?),
            TypeForm::Record { .. } => self.record_class(analysis, ty),
            TypeForm::Scalar => match ty {
                TypeId::INTEGER => "int".to_string(),
                TypeId::REAL => "double".to_string(),
                TypeId::BOOLEAN => "boolean".to_string(),
                TypeId::CHAR => "char".to_string(),
                TypeId::STRING => "String".to_string(),
                _ => "void".to_string(),
            },
            TypeForm::Error => return Err(Error::new(ErrorImpl::ErrorTypedNode, 0)),
        })
    }

    fn record_class(&self, analysis: &Analysis, ty: TypeId) -> String {
        match &analysis.types.get(ty).name {
            Some(name) => java_name(name),
            None => format!("$Record{}", ty.index()),
        }
    }

    /// Initial value expression of a fresh variable of type `ty`.
    pub fn default_expr(&self, analysis: &Analysis, ty: TypeId) -> Result<String, Error> {
        Ok(match analysis.types.form(ty) {
            TypeForm::Subrange { base, .. } => self.default_expr(analysis, *base)?,
            TypeForm::Enumeration { .. } => "0".to_string(),
            TypeForm::Array { .. } => format!("$newArray{}()", ty.index()),
            TypeForm::Record { .. } => format!("new {}()", self.record_class(analysis, ty)),
            _ => match ty {
                TypeId::REAL => "0.0".to_string(),
                TypeId::BOOLEAN => "false".to_string(),
                TypeId::CHAR => "' '".to_string(),
                TypeId::STRING => "\"\"".to_string(),
                _ => "0".to_string(),
            },
        })
    }

    /// Value-semantics copy of `expr`, a value of type `ty`.
    pub fn copy_expr(&self, analysis: &Analysis, expr: String, ty: TypeId) -> String {
        match analysis.types.form(ty) {
            TypeForm::Array { .. } => format!("$copyArray{}({})", ty.index(), expr),
            TypeForm::Record { .. } => format!("{}.copy()", expr),
            _ => expr,
        }
    }

    fn emit_enumerations(&mut self, analysis: &Analysis) {
        for index in 0..analysis.types.len() {
            let ty = TypeId::from_raw(index as u32);
            if let TypeForm::Enumeration { constants } = analysis.types.form(ty) {
                self.out.blank();
                for (ordinal, constant) in constants.iter().enumerate() {
                    self.out.line(&format!(
                        "public static final int {} = {};",
                        java_name(&analysis.symtab.entry(*constant).name),
                        ordinal
                    ));
                }
            }
        }
    }

    /// Named constants of a scope. Enumeration constants live at class level.
    fn emit_constants(&mut self, analysis: &Analysis, scope: ScopeId, modifiers: &str) -> Result<(), Error> {
        for id in analysis.symtab.entries_of(scope) {
            let entry = analysis.symtab.entry(*id);
            if entry.kind != SymbolKind::Constant || analysis.types.is_enumeration(entry.ty) {
                continue;
            }
            let value = entry
                .constant
                .as_ref()
                .ok_or_else(|| Error::internal(format!("constant `{}` has no value", entry.name), entry.line))?;
            self.out.line(&format!(
                "{}{} {} = {};",
                modifiers,
                self.java_type(analysis, entry.ty)?,
                java_name(&entry.name),
                value_literal(value)
            ));
        }
        Ok(())
    }

    fn emit_records(&mut self, analysis: &Analysis) -> Result<(), Error> {
        for index in 0..analysis.types.len() {
            let ty = TypeId::from_raw(index as u32);
            let TypeForm::Record { fields, .. } = analysis.types.form(ty) else {
                continue;
            };
            let class = self.record_class(analysis, ty);

            self.out.blank();
            self.out.open(&format!("public static class {}", class));
            for field in fields {
                let entry = analysis.symtab.entry(*field);
                self.out.line(&format!(
                    "public {} {} = {};",
                    self.java_type(analysis, entry.ty)?,
                    java_name(&entry.name),
                    self.default_expr(analysis, entry.ty)?
                ));
            }

            self.out.blank();
            self.out.open(&format!("public {} copy()", class));
            self.out.line(&format!("{} $copy = new {}();", class, class));
            for field in fields {
                let entry = analysis.symtab.entry(*field);
                let name = java_name(&entry.name);
                self.out.line(&format!(
                    "$copy.{} = {};",
                    name,
                    self.copy_expr(analysis, name.clone(), entry.ty)
                ));
            }
            self.out.line("return $copy;");
            self.out.close();
            self.out.close();
        }
        Ok(())
    }

    fn emit_array_factories(&mut self, analysis: &Analysis) -> Result<(), Error> {
        for index in 0..analysis.types.len() {
            let ty = TypeId::from_raw(index as u32);
            let TypeForm::Array { element, .. } = *analysis.types.form(ty) else {
                continue;
            };
            let array_type = self.java_type(analysis, ty)?;
            let element_type = self.java_type(analysis, element)?;
            let count = analysis.types.element_count(ty);

            self.out.blank();
            self.out
                .open(&format!("private static {} $newArray{}()", array_type, index));
            self.out.line(&format!(
                "{} $array = {};",
                array_type,
                allocation(&element_type, &count.to_string())
            ));
            self.out
                .open("for (int $i = 0; $i < $array.length; $i++)");
            self.out
                .line(&format!("$array[$i] = {};", self.default_expr(analysis, element)?));
            self.out.close();
            self.out.line("return $array;");
            self.out.close();

            self.out.blank();
            self.out.open(&format!(
                "private static {} $copyArray{}({} $source)",
                array_type, index, array_type
            ));
            self.out.line(&format!(
                "{} $array = {};",
                array_type,
                allocation(&element_type, "$source.length")
            ));
            self.out
                .open("for (int $i = 0; $i < $array.length; $i++)");
            self.out.line(&format!(
                "$array[$i] = {};",
                self.copy_expr(analysis, "$source[$i]".to_string(), element)
            ));
            self.out.close();
            self.out.line("return $array;");
            self.out.close();
        }
        Ok(())
    }

    fn emit_division_helpers(&mut self) {
        self.out.blank();
        self.out.open("private static void $fail(int line)");
        self.out.line(
            "System.out.printf(\"RUNTIME ERROR at line %d: Division by zero\\n\", line);",
        );
        self.out.line("System.out.flush();");
        self.out.line("System.exit(2);");
        self.out.close();

        let helpers = [
            ("double", "$divide", "b == 0.0", "a / b"),
            ("int", "$intDivide", "b == 0", "a / b"),
            ("int", "$modulo", "b == 0", "a % b"),
        ];
        for (ty, name, zero, result) in helpers {
            self.out.blank();
            self.out.open(&format!(
                "private static {} {}({} a, {} b, int line)",
                ty, name, ty, ty
            ));
            self.out.open(&format!("if ({})", zero));
            self.out.line("$fail(line);");
            self.out.close();
            self.out.line(&format!("return {};", result));
            self.out.close();
        }
    }

    fn emit_routine(&mut self, analysis: &Analysis, routine: SymbolId) -> Result<(), Error> {
        let entry = analysis.symtab.entry(routine);
        let info = analysis.routine_info(routine)?;
        let name = java_name(&entry.name);
        let node = info
            .node
            .ok_or_else(|| Error::internal("routine has no body", entry.line))?;

        let return_type = match info.return_type {
            Some(ty) => self.java_type(analysis, ty)?,
            None => "void".to_string(),
        };
        let mut params = vec![];
        for param in &info.params {
            let param = analysis.symtab.entry(*param);
            params.push(format!(
                "{} {}",
                self.java_type(analysis, param.ty)?,
                java_name(&param.name)
            ));
        }

        tracing::trace!(routine = %name, "converting routine");
        self.out.open(&format!(
            "public static {} {}({})",
            return_type,
            name,
            params.join(", ")
        ));

        if let Some(scope) = info.scope {
            self.emit_constants(analysis, scope, "final ")?;
        }
        for local in &info.locals {
            let local = analysis.symtab.entry(*local);
            self.out.line(&format!(
                "{} {} = {};",
                self.java_type(analysis, local.ty)?,
                java_name(&local.name),
                self.default_expr(analysis, local.ty)?
            ));
        }
        if let Some(ty) = info.return_type {
            self.out.line(&format!(
                "{} {} = {};",
                return_type,
                name,
                self.default_expr(analysis, ty)?
            ));
        }

        self.emit_body(analysis, node)?;

        if info.return_type.is_some() {
            self.out.line(&format!("return {};", name));
        }
        self.out.close();
        Ok(())
    }

    fn emit_body(&mut self, analysis: &Analysis, owner: NodeId) -> Result<(), Error> {
        let statements = analysis
            .tree
            .body_block(owner)
            .and_then(|block| analysis.tree.block_statements(block))
            .ok_or_else(|| Error::internal("body has no statements", analysis.tree.line(owner)))?;
        self.emit_stmt(analysis, statements)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new()
    }
}

/// `new T[count]` for an element type that may itself be an array.
fn allocation(element_type: &str, count: &str) -> String {
    match element_type.find('[') {
        Some(split) => format!(
            "new {}[{}]{}",
            &element_type[..split],
            count,
            &element_type[split..]
        ),
        None => format!("new {}[{}]", element_type, count),
    }
}

//! Rendering sequences as unit-test source.
//!
//! The renderer consumes, per statement, its display name, static type and
//! render text, plus the sequence's failure and violated-contract
//! annotations. [`JUnitRenderer`] emits JUnit 5 test methods; other
//! frameworks plug in through [`TestRenderer`].

use std::fmt::Write;

use seqgen_types::Value;

use crate::sequence::{Rejection, Sequence};
use crate::statement::Statement;

pub trait TestRenderer {
    /// One test case for `seq`.
    fn render_case(&self, seq: &Sequence, is_valid: bool) -> String;

    /// A complete test-suite compilation unit.
    fn render_suite(&self, header: &SuiteHeader, valid: &[&Sequence], invalid: &[&Sequence])
        -> String;
}

/// Where the generated suite lives.
#[derive(Debug, Clone)]
pub struct SuiteHeader {
    pub package: String,
    pub class_name: String,
    /// Free-form line placed in the suite's leading comment.
    pub banner: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JUnitRenderer {
    pub indent: String,
    pub method_prefix: String,
}

impl Default for JUnitRenderer {
    fn default() -> Self {
        Self {
            indent: "  ".into(),
            method_prefix: "generatedTest".into(),
        }
    }
}

impl JUnitRenderer {
    fn statement_lines(&self, seq: &Sequence, depth: usize) -> Vec<String> {
        let pad = self.indent.repeat(depth);
        let statements = seq.statements();
        statements
            .iter()
            .enumerate()
            .map(|(i, stmt)| format!("{pad}{};", stmt.render(&statements[..i])))
            .collect()
    }

    /// Self-equality, hashCode and toString checks for a produced object.
    fn oracle_lines(&self, stmt: &Statement, index: usize, depth: usize) -> Vec<String> {
        let pad = self.indent.repeat(depth);
        let name = stmt.display_name(index);
        vec![
            format!("{pad}Assertions.assertTrue({name}.equals({name}));"),
            format!("{pad}{name}.hashCode();"),
            format!("{pad}{name}.toString();"),
        ]
    }
}

/// Statements whose produced value is an object worth asserting on.
fn checkable(stmt: &Statement) -> bool {
    let ty = stmt.produced_type();
    ty.is_reference() && stmt.value().map_or(false, |v| !v.is_null())
}

impl TestRenderer for JUnitRenderer {
    fn render_case(&self, seq: &Sequence, is_valid: bool) -> String {
        let pad = &self.indent;
        let body = pad.repeat(2);
        let mut out = String::new();
        let _ = writeln!(out, "{pad}@Test");
        let _ = writeln!(
            out,
            "{pad}public void {}_{}() throws Throwable {{",
            self.method_prefix,
            seq.id()
        );

        if is_valid {
            out.extend(self.statement_lines(seq, 2).into_iter().map(|l| l + "\n"));
            for (i, stmt) in seq.statements().iter().enumerate() {
                if checkable(stmt) {
                    out.extend(self.oracle_lines(stmt, i, 2).into_iter().map(|l| l + "\n"));
                }
            }
        } else if let Some(failure) = seq.failure() {
            let _ = writeln!(
                out,
                "{body}// statement {} raised {}",
                failure.statement, failure.fault
            );
            if let Some(contract) = seq.violated_contract() {
                let _ = writeln!(out, "{body}// violated contract: {contract}");
            }
            let _ = writeln!(out, "{body}Assertions.assertThrows(Throwable.class, () -> {{");
            out.extend(self.statement_lines(seq, 3).into_iter().map(|l| l + "\n"));
            let _ = writeln!(out, "{body}}});");
        } else {
            match (seq.violation(), seq.rejection()) {
                (Some(violation), _) => {
                    let _ = writeln!(
                        out,
                        "{body}// violated contract: {} at statement {} ({})",
                        violation.contract, violation.statement, violation.reason
                    );
                }
                (None, Some(Rejection::Filtered { filter })) => {
                    let _ = writeln!(out, "{body}// rejected by {filter}");
                }
                (None, Some(Rejection::DuplicateStructure)) => {
                    let _ = writeln!(out, "{body}// rejected: duplicate structure");
                }
                _ => {}
            }
            out.extend(self.statement_lines(seq, 2).into_iter().map(|l| l + "\n"));
            if let Some(stmt) = seq.violating_statement() {
                let index = seq.violation().map_or(0, |v| v.statement);
                if checkable(stmt) {
                    out.extend(self.oracle_lines(stmt, index, 2).into_iter().map(|l| l + "\n"));
                }
            }
        }

        let _ = writeln!(out, "{pad}}}");
        out
    }

    fn render_suite(
        &self,
        header: &SuiteHeader,
        valid: &[&Sequence],
        invalid: &[&Sequence],
    ) -> String {
        let mut out = String::new();
        if !header.package.is_empty() {
            let _ = writeln!(out, "package {};", header.package);
            out.push('\n');
        }
        out.push_str("import org.junit.jupiter.api.Assertions;\n");
        out.push_str("import org.junit.jupiter.api.Test;\n\n");
        if let Some(banner) = &header.banner {
            let _ = writeln!(out, "// {banner}");
        }
        let _ = writeln!(out, "public class {} {{", header.class_name);
        for seq in valid {
            out.push('\n');
            out.push_str(&self.render_case(seq, true));
        }
        for seq in invalid {
            out.push('\n');
            out.push_str(&self.render_case(seq, false));
        }
        out.push_str("}\n");
        out
    }
}

/// Java source literal for a value.
pub fn java_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Char(c) => format!("'{}'", escape_char(*c, '\'')),
        Value::Str(s) => {
            let escaped: String = s.chars().map(|c| escape_char(c, '"')).collect();
            format!("\"{escaped}\"")
        }
        Value::Array(elem, items) => format!(
            "new {}[]{{{}}}",
            elem.simple_name(),
            items.iter().map(java_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::List(items) if items.is_empty() => "new java.util.ArrayList<>()".into(),
        Value::List(items) => format!(
            "java.util.Arrays.asList({})",
            items.iter().map(java_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(o) => format!("null /* {} instance */", o.type_name()),
    }
}

fn escape_char(c: char, quote: char) -> String {
    match c {
        '\\' => "\\\\".into(),
        '\n' => "\\n".into(),
        '\t' => "\\t".into(),
        '\r' => "\\r".into(),
        c if c == quote => format!("\\{c}"),
        c if (' '..='~').contains(&c) => c.to_string(),
        c => {
            let mut buf = [0u16; 2];
            c.encode_utf16(&mut buf)
                .iter()
                .map(|unit| format!("\\u{unit:04x}"))
                .collect()
        }
    }
}

//! Indented C++ text output.

/// Accumulates generated source with four-space indentation.
#[derive(Debug, Default)]
pub struct CodeWriter {
    output: String,
    indent: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writeln(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.output.push_str("    ");
            }
            self.output.push_str(s);
        }
        self.output.push('\n');
    }

    pub fn blank(&mut self) {
        self.output.push('\n');
    }

    pub fn lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.writeln(line.as_ref());
        }
    }

    /// Write `header`, run `body` one level deeper, then close with `footer`.
    pub fn block(&mut self, header: &str, footer: &str, body: impl FnOnce(&mut Self)) {
        self.writeln(header);
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.writeln(footer);
    }

    pub fn finish(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indents_body() {
        let mut w = CodeWriter::new();
        w.block("if (x) {", "}", |w| {
            w.writeln("y();");
            w.blank();
            w.block("while (z) {", "}", |w| w.writeln("z--;"));
        });
        assert_eq!(
            w.finish(),
            "if (x) {\n    y();\n\n    while (z) {\n        z--;\n    }\n}\n"
        );
    }
}

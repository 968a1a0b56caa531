//! Line-level parsing of `objdump --dwarf=info` output.
//!
//! A record is one header line followed by its indented attribute lines:
//!
//! ```text
//!  <1><2d>: Abbrev Number: 5 (DW_TAG_class_type)
//!     <2e>   DW_AT_name        : (indirect string, offset: 0x1d): Sensor
//!     <32>   DW_AT_byte_size   : 8
//! ```

use crate::error::Result;
use crate::tag::Tag;
use indexmap::IndexMap;
use mbedwrap_common::{Diagnostic, Diagnostics};
use regex::Regex;
use smol_str::SmolStr;

/// One flat debug-info record, before it is placed in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord {
    pub level: u32,
    pub address: SmolStr,
    pub abbrev: u32,
    pub tag: Tag,
    /// Declared name with any compiler annotation stripped.
    pub name: Option<SmolStr>,
    /// The `DW_AT_name` value exactly as it appeared in the dump.
    pub full_name: Option<String>,
    /// Every other attribute, keyed by the `DW_AT_` suffix.
    pub attributes: IndexMap<SmolStr, String>,
    /// 0-based index of the header line.
    pub line: usize,
}

impl SymbolRecord {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Compiled line patterns for the record grammar.
#[derive(Debug, Clone)]
pub struct RecordParser {
    header: Regex,
    header_start: Regex,
    attribute: Regex,
    annotated_name: Regex,
}

impl RecordParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header: Regex::new(
                r"^\s*<(\d+)><([0-9a-fA-F]+)>:\s*Abbrev Number:\s*(\d+)\s+\(DW_TAG_([^)]+)\)",
            )?,
            header_start: Regex::new(r"^\s*<\d+><")?,
            attribute: Regex::new(r"^\s*<([0-9a-fA-F]+)>\s*DW_AT_(\w+)\s*:\s*(.*)$")?,
            annotated_name: Regex::new(r"^\([^)]+\):\s*(.+)$")?,
        })
    }

    /// Whether `line` looks like a record header (well-formed or not).
    pub fn is_header(&self, line: &str) -> bool {
        self.header_start.is_match(line)
    }

    fn is_attribute_line(&self, line: &str) -> bool {
        line.starts_with("  ") && line.trim_start().starts_with('<') && !self.is_header(line)
    }

    /// Parse the record whose header is at `lines[start]`.
    ///
    /// Returns the record, if there was a usable one, and the index of the
    /// first line not consumed. Terminator records (`Abbrev Number: 0`) yield
    /// `None` silently; malformed headers yield `None` plus a warning, and
    /// their attribute lines are skipped along with them.
    pub fn parse(
        &self,
        lines: &[&str],
        start: usize,
        diags: &mut Diagnostics,
    ) -> (Option<SymbolRecord>, usize) {
        let Some(first) = lines.get(start) else {
            return (None, start);
        };

        let Some(header) = self.parse_header(first, start) else {
            let next = self.skip_attributes(lines, start + 1);
            if !is_terminator(first) {
                diags.push(
                    Diagnostic::warning(format!("Cannot parse record header: {}", first.trim()))
                        .at_line(start),
                );
            }
            return (None, next);
        };

        let mut record = header;
        let mut ix = start + 1;
        while let Some(line) = lines.get(ix) {
            if !self.is_attribute_line(line) {
                break;
            }
            match self.attribute.captures(line) {
                Some(caps) => {
                    let key = &caps[2];
                    let value = caps[3].trim();
                    if key == "name" {
                        record.full_name = Some(value.to_string());
                        record.name = Some(self.strip_annotation(value));
                    } else {
                        record
                            .attributes
                            .insert(SmolStr::new(key), value.to_string());
                    }
                }
                None => diags.push(
                    Diagnostic::warning(format!("Cannot parse attribute: {}", line.trim()))
                        .at_line(ix),
                ),
            }
            ix += 1;
        }

        (Some(record), ix)
    }

    fn parse_header(&self, line: &str, index: usize) -> Option<SymbolRecord> {
        let caps = self.header.captures(line)?;
        let level = caps[1].parse().ok()?;
        let abbrev = caps[3].parse().ok()?;
        Some(SymbolRecord {
            level,
            address: SmolStr::new(caps[2].to_ascii_lowercase()),
            abbrev,
            tag: Tag::from_dwarf(&caps[4]),
            name: None,
            full_name: None,
            attributes: IndexMap::new(),
            line: index,
        })
    }

    fn skip_attributes(&self, lines: &[&str], mut ix: usize) -> usize {
        while lines.get(ix).is_some_and(|l| self.is_attribute_line(l)) {
            ix += 1;
        }
        ix
    }

    /// `(indirect string, offset: 0x1d): Sensor` -> `Sensor`
    fn strip_annotation(&self, raw: &str) -> SmolStr {
        match self.annotated_name.captures(raw) {
            Some(caps) => SmolStr::new(caps[1].trim()),
            None => SmolStr::new(raw),
        }
    }
}

fn is_terminator(line: &str) -> bool {
    line.contains("Abbrev Number: 0")
        && !line.contains("(DW_TAG_")
        && line
            .split("Abbrev Number: 0")
            .nth(1)
            .map_or(true, |rest| !rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Scan a whole dump and return its records in document order.
pub fn parse_records(text: &str, diags: &mut Diagnostics) -> Result<Vec<SymbolRecord>> {
    let parser = RecordParser::new()?;
    let lines: Vec<&str> = text.lines().collect();
    let mut records = Vec::new();

    let mut ix = 0;
    while ix < lines.len() {
        if !parser.is_header(lines[ix]) {
            ix += 1;
            continue;
        }
        let (record, next) = parser.parse(&lines, ix, diags);
        records.extend(record);
        ix = next.max(ix + 1);
    }

    tracing::debug!(records = records.len(), lines = lines.len(), "parsed dump");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_parse_header_and_attributes() {
        let dump = lines(
            " <1><2d>: Abbrev Number: 5 (DW_TAG_class_type)\n    <2e>   DW_AT_name        : Sensor\n    <32>   DW_AT_byte_size   : 8\n <2><33>: Abbrev Number: 0",
        );
        let parser = RecordParser::new().unwrap();
        let mut diags = Diagnostics::new();

        let (record, next) = parser.parse(&dump, 0, &mut diags);
        let record = record.unwrap();

        assert_eq!(next, 3);
        assert_eq!(record.level, 1);
        assert_eq!(record.address, "2d");
        assert_eq!(record.abbrev, 5);
        assert_eq!(record.tag, Tag::ClassType);
        assert_eq!(record.name.as_deref(), Some("Sensor"));
        assert_eq!(record.attr("byte_size"), Some("8"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_annotated_name_keeps_full_name() {
        let dump = lines(
            " <2><40>: Abbrev Number: 7 (DW_TAG_subprogram)\n    <41>   DW_AT_name        : (indirect string, offset: 0x1d): read\n",
        );
        let parser = RecordParser::new().unwrap();
        let mut diags = Diagnostics::new();

        let (record, _) = parser.parse(&dump, 0, &mut diags);
        let record = record.unwrap();

        assert_eq!(record.name.as_deref(), Some("read"));
        assert_eq!(
            record.full_name.as_deref(),
            Some("(indirect string, offset: 0x1d): read")
        );
    }

    #[test]
    fn test_terminator_is_silent() {
        let dump = lines(" <2><58>: Abbrev Number: 0");
        let parser = RecordParser::new().unwrap();
        let mut diags = Diagnostics::new();

        let (record, next) = parser.parse(&dump, 0, &mut diags);
        assert!(record.is_none());
        assert_eq!(next, 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_malformed_header_skips_its_attributes() {
        let dump = lines(
            " <1><2d>: Abbrev Number: five (DW_TAG_class_type)\n    <2e>   DW_AT_name        : Sensor\n <1><40>: Abbrev Number: 3 (DW_TAG_base_type)",
        );
        let parser = RecordParser::new().unwrap();
        let mut diags = Diagnostics::new();

        let (record, next) = parser.parse(&dump, 0, &mut diags);
        assert!(record.is_none());
        assert_eq!(next, 2);
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(diags.iter().next().unwrap().line, Some(1));
    }

    #[test]
    fn test_unparseable_attribute_is_warned_and_skipped() {
        let dump = lines(
            " <1><2d>: Abbrev Number: 5 (DW_TAG_base_type)\n    <2e>   Unknown AT value: 2119: 1\n    <30>   DW_AT_name        : int",
        );
        let parser = RecordParser::new().unwrap();
        let mut diags = Diagnostics::new();

        let (record, next) = parser.parse(&dump, 0, &mut diags);
        assert_eq!(next, 3);
        assert_eq!(record.unwrap().name.as_deref(), Some("int"));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_parse_records_skips_banners() {
        let dump = "Contents of the .debug_info section:\n\n  Compilation Unit @ offset 0x0:\n   Length:        0x1c0 (32-bit)\n <0><b>: Abbrev Number: 1 (DW_TAG_compile_unit)\n    <c>   DW_AT_language    : 4\t(C++)\n <1><2d>: Abbrev Number: 2 (DW_TAG_base_type)\n    <2e>   DW_AT_name        : int\n <1><30>: Abbrev Number: 0\n";
        let mut diags = Diagnostics::new();

        let records = parse_records(dump, &mut diags).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, Tag::CompileUnit);
        assert_eq!(records[1].tag, Tag::BaseType);
        assert!(diags.is_empty());
    }
}

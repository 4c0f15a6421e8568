// file: src/vbox/parser.rs
// version: 1.0.0
// guid: c04a7e52-9b1d-4f36-8a2c-7d5e0b18f9a3

//! Parser for the `key: value` block output of `VBoxManage list` and
//! `VBoxManage showvminfo`.
//!
//! The tool prints one record per block, with blocks separated by a blank
//! line. Values are padded with whitespace to line them up in columns:
//!
//! ```text
//! ID:          Other
//! Description: Other/Unknown
//! Family ID:   Other
//!
//! ID:          Windows31
//! Description: Windows 3.1
//! ```

use std::collections::BTreeMap;

/// Line separator used by VBoxManage on this platform
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";

/// Line separator used by VBoxManage on this platform
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// One parsed block of output. Later keys overwrite earlier ones.
pub type Record = BTreeMap<String, String>;

/// Split `output` into blank-line-delimited records.
///
/// Each line is split on its first colon; the value is trimmed and the key
/// is kept as printed. Lines without a colon are skipped.
pub fn parse_records(output: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current = Record::new();

    for line in output.split(LINE_SEPARATOR) {
        if line.is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        current.insert(key.to_string(), value.trim().to_string());
    }

    if !current.is_empty() {
        records.push(current);
    }

    records
}

/// Remove exactly one trailing platform line separator, if present.
pub fn chomp_newline(output: &str) -> &str {
    output.strip_suffix(LINE_SEPARATOR).unwrap_or(output)
}

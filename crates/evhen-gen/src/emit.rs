//! C header rendering of table sets.
//!
//! Each round becomes `const tbox_t <name>_<round>[16][256]`, indexed by
//! lane and then by input byte, so a C consumer can evaluate a round as
//! the XOR of sixteen table rows.

use core::fmt::Write as _;
use std::path::Path;

use crate::tables::TableSet;

/// Table name used for the encryption chain.
pub const ENCRYPTION_TABLE_NAME: &str = "wb_encr_tbl";

/// Table name used for the decryption chain.
pub const DECRYPTION_TABLE_NAME: &str = "wb_decr_tbl";

/// Include-guard stem for an output path: the file name up to its first
/// `.`, uppercased, with non-identifier characters replaced by `_`.
pub fn guard_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let mut guard: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if guard.is_empty() || guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert_str(0, "EVHEN_");
    }
    guard
}

/// Renders `set` as a C header guarded by `<guard>_H`.
pub fn render_c_header(set: &TableSet, guard: &str, table_name: &str) -> String {
    let mut out = String::with_capacity(set.len() * 16 * 256 * 70);
    // Writing into a String cannot fail.
    let _ = write_header(&mut out, set, guard, table_name);
    out
}

fn write_header(
    out: &mut String,
    set: &TableSet,
    guard: &str,
    table_name: &str,
) -> core::fmt::Result {
    writeln!(out, "/* Generated EVHEN white-box tables: {} rounds. */", set.len())?;
    writeln!(out)?;
    writeln!(out, "#ifndef {guard}_H")?;
    writeln!(out, "#define {guard}_H")?;
    writeln!(out)?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;
    writeln!(out, "#ifndef EVHEN_TBOX_T")?;
    writeln!(out, "#define EVHEN_TBOX_T")?;
    writeln!(out, "typedef uint8_t tbox_t[16];")?;
    writeln!(out, "#endif")?;
    writeln!(out)?;

    for (index, round) in set.rounds.iter().enumerate() {
        writeln!(out, "const tbox_t {table_name}_{index}[16][256] = {{")?;
        for (lane, table) in round.lanes.iter().enumerate() {
            writeln!(out, "{{")?;
            for (k, entry) in table.entries().iter().enumerate() {
                out.push_str("{ ");
                for (i, byte) in entry.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write!(out, "{byte}")?;
                }
                out.push_str(if k == 255 { " }\n" } else { " },\n" });
            }
            out.push_str(if lane + 1 == round.lanes.len() { "}\n" } else { "},\n" });
        }
        writeln!(out, "}};")?;
    }

    writeln!(out)?;
    writeln!(out, "#endif /* {guard}_H */")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::RoundTables;

    #[test]
    fn guard_comes_from_file_stem() {
        assert_eq!(guard_stem(Path::new("out/wb_encr_tbl.h")), "WB_ENCR_TBL");
        assert_eq!(guard_stem(Path::new("tables.v2.h")), "TABLES");
        assert_eq!(guard_stem(Path::new("9-tables.h")), "EVHEN_9_TABLES");
    }

    #[test]
    fn header_lists_every_round_and_entry() {
        let mut round = RoundTables::new_zeroed();
        let mut value = [0u8; 16];
        value[0] = 200;
        value[15] = 7;
        round.lanes[3].set(255, &value);
        let set = TableSet {
            rounds: vec![RoundTables::new_zeroed(), round],
        };
        let text = render_c_header(&set, "WB_ENCR_TBL", ENCRYPTION_TABLE_NAME);

        assert!(text.contains("#ifndef WB_ENCR_TBL_H\n#define WB_ENCR_TBL_H\n"));
        assert!(text.contains("const tbox_t wb_encr_tbl_0[16][256] = {\n"));
        assert!(text.contains("const tbox_t wb_encr_tbl_1[16][256] = {\n"));
        assert!(!text.contains("wb_encr_tbl_2"));
        assert!(text.contains("{ 200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 7 }\n"));
        assert!(text.trim_end().ends_with("#endif /* WB_ENCR_TBL_H */"));
        let rows = text.lines().filter(|l| l.starts_with("{ ")).count();
        assert_eq!(rows, 2 * 16 * 256);
    }
}

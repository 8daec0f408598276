//! TypeScript enum generation.
//!
//! Enums are string-valued, matching the canonical JSON encoding where an
//! enum value travels as its declared name.

use std::fmt;

use protots_schema::EnumDef;

use crate::code_writer::CodeWriter;
use crate::cw_writeln;

pub fn write_enum<W: fmt::Write>(w: &mut CodeWriter<W>, en: &EnumDef) -> fmt::Result {
    w.block(&format!("export enum {}", en.name), |w| {
        for value in &en.value {
            cw_writeln!(w, "{0} = \"{0}\",", value.name)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use protots_schema::EnumValueDef;

    #[test]
    fn values_keep_declared_order_and_names() {
        let en = EnumDef {
            name: "Status".into(),
            value: vec![
                EnumValueDef {
                    name: "STATUS_UNSPECIFIED".into(),
                    number: 0,
                },
                EnumValueDef {
                    name: "STATUS_ACTIVE".into(),
                    number: 2,
                },
                EnumValueDef {
                    name: "STATUS_BANNED".into(),
                    number: 1,
                },
            ],
        };

        let mut out = String::new();
        write_enum(&mut CodeWriter::with_indent_spaces(&mut out, 2), &en).unwrap();
        assert_eq!(
            out,
            "export enum Status {\n  STATUS_UNSPECIFIED = \"STATUS_UNSPECIFIED\",\n  STATUS_ACTIVE = \"STATUS_ACTIVE\",\n  STATUS_BANNED = \"STATUS_BANNED\",\n}\n"
        );
    }
}

// This module renders a compiled table as the C header consumed by the runtime
// verifier. The artifact has two parts: the trie_table array, one 256-entry row per
// state with the state id and accept class noted in a comment, laid out with the
// column/row guide comments the verifier's maintainers expect when diffing generated
// tables; and the verifier_t descriptor struct carrying the state count, the start
// state, the distinguished control-transfer state ids and the ordinary accept-state
// list. The writer is purely mechanical: every decision about ids and classes was
// made by the table compiler, so two identical tables always serialize to identical
// bytes.

//! C header emission for the compiled table.

use std::io::{self, Write};

use crate::encoding::AcceptClass;
use crate::table::CompiledTable;

fn accept_comment(class: Option<AcceptClass>) -> &'static str {
    match class {
        None => "False",
        Some(AcceptClass::Ordinary) => "True",
        Some(c) => c.label(),
    }
}

/// Write the complete header artifact.
pub fn write_header<W: Write>(out: &mut W, table: &CompiledTable) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;

    writeln!(out, "static const uint16_t trie_table[][256] = {{")?;
    for state in 0..table.states() {
        let class = table.class_of(state as u16);
        writeln!(
            out,
            "  /* state {}: accept={} */ {{",
            state,
            accept_comment(class)
        )?;
        write!(out, "{}/* ", " ".repeat(11))?;
        let header: Vec<String> = (0..16).map(|low| format!("X{low:x}")).collect();
        writeln!(out, "{} */", header.join("  "))?;
        let row = table.row(state as u16);
        for upper in 0..16 {
            write!(out, "    /* {upper:x}X */  ")?;
            let cells: Vec<String> = (0..16)
                .map(|low| format!("{:2}", row[upper * 16 + low]))
                .collect();
            writeln!(out, "{},", cells.join(", "))?;
        }
        writeln!(out, "  }},")?;
    }
    writeln!(out, "}};")?;

    let d = &table.descriptor;
    let accept_len = d.accept.len().max(1);
    let accept_list = if d.accept.is_empty() {
        "0".to_string()
    } else {
        d.accept
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    writeln!(out, "static const struct verifier_t {{")?;
    writeln!(out, "  uint16_t *dfa;")?;
    writeln!(out, "  int states;")?;
    writeln!(out, "  uint16_t start;")?;
    writeln!(out, "  uint16_t dcall;")?;
    writeln!(out, "  uint16_t icall;")?;
    writeln!(out, "  uint16_t jmp_rel1;")?;
    writeln!(out, "  uint16_t jmp_rel4;")?;
    writeln!(out, "  uint16_t ijmp;")?;
    writeln!(out, "  uint16_t mcficall;")?;
    writeln!(out, "  uint16_t mcficheck;")?;
    writeln!(out, "  uint16_t mcfiret;")?;
    writeln!(out, "  int count; // number of accept states")?;
    writeln!(out, "  uint16_t accept[{accept_len}]; // the ordinary accept states")?;
    writeln!(out, "}} verifier = {{")?;
    writeln!(out, "  (uint16_t*)trie_table,")?;
    writeln!(out, "  {}, /* states */", d.states)?;
    writeln!(out, "  {}, /* start */", d.start)?;
    writeln!(out, "  {}, /* dcall */", d.dcall)?;
    writeln!(out, "  {}, /* icall */", d.icall)?;
    writeln!(out, "  {}, /* jmp_rel1 */", d.jmp_rel1)?;
    writeln!(out, "  {}, /* jmp_rel4 */", d.jmp_rel4)?;
    writeln!(out, "  {}, /* ijmp */", d.ijmp)?;
    writeln!(out, "  {}, /* mcficall */", d.mcficall)?;
    writeln!(out, "  {}, /* mcficheck */", d.mcficheck)?;
    writeln!(out, "  {}, /* mcfiret */", d.mcfiret)?;
    writeln!(out, "  {}, /* count */", d.accept.len())?;
    writeln!(out, "  {{ {accept_list} }} /* accept */")?;
    writeln!(out, "}};")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Record;
    use crate::table;
    use crate::trie::Trie;

    fn sample() -> CompiledTable {
        let lines = [
            "01 c0:",
            "f4:terminator",
            "eb XX:jmp_rel1",
            "e9 XX XX XX XX:jmp_rel4",
            "e8 XX XX XX XX:dcall",
            "ff d0:icall",
            "a0:mcficall",
            "a1:mcficheck",
            "a2:mcfiret",
        ];
        let mut trie = Trie::new();
        for (i, line) in lines.iter().enumerate() {
            trie.insert(&Record::parse(line, i + 1).unwrap()).unwrap();
        }
        table::compile(&trie.reduce()).unwrap()
    }

    #[test]
    fn header_has_table_and_descriptor() {
        let t = sample();
        let mut buf = Vec::new();
        write_header(&mut buf, &t).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("#include <stdint.h>"));
        assert!(text.contains("static const uint16_t trie_table[][256] = {"));
        assert!(text.contains("/* state 0: accept=False */"));
        assert!(text.contains("accept=jmp_rel4"));
        assert!(text.contains(&format!("{}, /* states */", t.states())));
        assert!(text.contains(&format!("{}, /* mcfiret */", t.descriptor.mcfiret)));
    }

    #[test]
    fn reject_row_renders_as_zeros() {
        let t = sample();
        let mut buf = Vec::new();
        write_header(&mut buf, &t).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let first_row = text
            .lines()
            .find(|l| l.trim_start().starts_with("/* 0X */"))
            .unwrap();
        assert!(first_row.contains(" 0,  0,  0"));
    }

    #[test]
    fn emission_is_byte_stable() {
        let t = sample();
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_header(&mut a, &t).unwrap();
        write_header(&mut b, &t).unwrap();
        assert_eq!(a, b);
    }
}

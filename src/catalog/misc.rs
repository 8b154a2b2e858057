// One-off catalog entries: the canonical nop ladder, stack-frame helpers (enter and
// leave re-mask the stack pointer with a trailing mov %esp,%esp), sign-extension and
// flag housekeeping, cpuid, and the two trap instructions that terminate control
// flow. hlt and int3 are the only Terminator-class entries in the catalog.

use super::{fam, fam_class, InstForm, D, F};
use crate::encoding::AcceptClass;

pub fn register(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "nop");
    g.f(F { opcode: vec![0x90], ..D });
    g.f(F { opcode: vec![0x66, 0x90], ..D });
    g.f(F { opcode: vec![0x0f, 0x1f, 0x00], ..D });
    g.f(F { opcode: vec![0x0f, 0x1f, 0x40, 0x00], ..D });
    g.f(F { opcode: vec![0x0f, 0x1f, 0x44, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x66, 0x0f, 0x1f, 0x44, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x0f, 0x1f, 0x80, 0x00, 0x00, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x0f, 0x1f, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x66, 0x0f, 0x1f, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x66, 0x66, 0x0f, 0x1f, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00], ..D });
    g.f(F { opcode: vec![0x66, 0x66, 0x66, 0x0f, 0x1f, 0x84, 0x00, 0x00, 0x00, 0x00, 0x00], ..D });

    // enter/leave re-establish the stack mask with mov %esp,%esp
    let mut g = fam(forms, "enter");
    g.f(F { opcode: vec![0xc8], imm: 16, extra: vec![0x00, 0x89, 0xe4], ..D });
    let mut g = fam(forms, "leave");
    g.f(F { opcode: vec![0xc9], extra: vec![0x89, 0xe4], ..D });

    let mut g = fam(forms, "cqo");
    g.f(F { rex: "0100 1000", opcode: vec![0x99], ..D });
    let mut g = fam(forms, "cdq");
    g.f(F { opcode: vec![0x99], ..D });
    let mut g = fam(forms, "clc");
    g.f(F { opcode: vec![0xf8], ..D });
    let mut g = fam(forms, "cld");
    g.f(F { opcode: vec![0xfc], ..D });
    let mut g = fam(forms, "cpuid");
    g.f(F { opcode: vec![0x0f, 0xa2], ..D });
    let mut g = fam(forms, "sahf");
    g.f(F { opcode: vec![0x9e], ..D });
    let mut g = fam(forms, "fwait");
    g.f(F { opcode: vec![0x9b], ..D });

    let mut g = fam_class(forms, "hlt", AcceptClass::Terminator);
    g.f(F { opcode: vec![0xf4], ..D });
    let mut g = fam_class(forms, "int3", AcceptClass::Terminator);
    g.f(F { opcode: vec![0xcc], ..D });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::BuildResult;

    #[test]
    fn traps_are_terminators() {
        let mut forms = Vec::new();
        register(&mut forms);
        let records: Vec<_> = Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        let hlt = records.iter().find(|r| r.to_string().starts_with("f4")).unwrap();
        assert_eq!(hlt.class, AcceptClass::Terminator);
        assert_eq!(hlt.to_string(), "f4:terminator");
        assert!(records.iter().any(|r| r.to_string() == "cc:terminator"));
        assert!(records.iter().any(|r| r.to_string() == "c8 XX XX 00 89 e4:"));
    }
}

// Catalog data for the SSE/SSE2 subset: packed and scalar moves, converts,
// packed logic and arithmetic, comparisons and the two SSE4 forms (roundsd,
// extractps). Scalar-double forms carry the f2 mandatory prefix, scalar-single
// forms f3, and the 66-prefixed forms reuse the operand-size constant. Store
// directions towards memory take the address-size override like every other
// memory-writing form in the catalog.

use super::{fam, InstForm, ASIZE, ASIZE_OSIZE, D, F, OSIZE};
use crate::addressing::NO_RSP;

const RR: &str = "11 reg1 reg2";
const MEM: &str = "mod reg r/m";
const XMM_RR: &str = "11 xmm1 xmm2";
const XMM_MEM: &str = "mod xmm r/m";

const F2: &[u8] = &[0xf2];
const F3: &[u8] = &[0xf3];
const ASIZE_F2: &[u8] = &[0x67, 0xf2];
const ASIZE_F3: &[u8] = &[0x67, 0xf3];

pub fn register(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "movaps");
    g.f(F { opcode: vec![0x0f, 0x28], modrm: XMM_RR, ..D });
    g.f(F { opcode: vec![0x0f, 0x28], modrm: XMM_MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0x29], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x0f, 0x29], modrm: XMM_MEM, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0x28], modrm: XMM_RR, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0x28], modrm: XMM_MEM, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0x29], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x29], modrm: XMM_MEM, ..D });

    let mut g = fam(forms, "movss");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x10], modrm: XMM_RR, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x10], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x11], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F3, opcode: vec![0x0f, 0x11], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x10], modrm: XMM_RR, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x10], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x11], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x11], modrm: XMM_MEM, ..D });

    let mut g = fam(forms, "movsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x10], modrm: XMM_RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x10], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x11], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F2, opcode: vec![0x0f, 0x11], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x10], modrm: XMM_RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x10], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x11], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x11], modrm: XMM_MEM, ..D });

    let mut g = fam(forms, "movq");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x7e], modrm: XMM_RR, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x7e], modrm: XMM_RR, ..D });

    let mut g = fam(forms, "movd");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x6e], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x7e], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x6e], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x7e], modrm: XMM_RR, no_rm: NO_RSP, ..D });

    let mut g = fam(forms, "movdqa");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x6f], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x6f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x7f], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x0f, 0x7f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x6f], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x6f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x7f], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x7f], modrm: XMM_MEM, ..D });

    let mut g = fam(forms, "movdqu");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x6f], modrm: XMM_RR, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x6f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x7f], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F3, opcode: vec![0x0f, 0x7f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x6f], modrm: XMM_RR, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x6f], modrm: XMM_MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x7f], modrm: XMM_RR, ..D });
    g.f(F { prefix: ASIZE_F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x7f], modrm: XMM_MEM, ..D });

    let mut g = fam(forms, "movapd");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x28], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x29], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x28], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x29], modrm: XMM_RR, ..D });

    // packed single-precision logic and arithmetic share one shape
    for (name, op) in [
        ("andps", 0x54u8),
        ("orps", 0x56),
        ("xorps", 0x57),
        ("addps", 0x58),
        ("mulps", 0x59),
        ("subps", 0x5c),
        ("divps", 0x5e),
    ] {
        let mut g = fam(forms, name);
        g.f(F { opcode: vec![0x0f, op], modrm: XMM_RR, ..D });
        g.f(F { opcode: vec![0x0f, op], modrm: XMM_MEM, ..D });
        g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, op], modrm: XMM_RR, ..D });
        g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, op], modrm: XMM_MEM, ..D });
    }

    let mut g = fam(forms, "movmskps");
    g.f(F { opcode: vec![0x0f, 0x50], modrm: XMM_RR, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0x50], modrm: XMM_RR, ..D });

    let mut g = fam(forms, "movmskpd");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x50], modrm: XMM_RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x50], modrm: XMM_RR, ..D });

    let mut g = fam(forms, "shufps");
    g.f(F { opcode: vec![0x0f, 0xc6], modrm: XMM_RR, imm: 8, ..D });
    g.f(F { opcode: vec![0x0f, 0xc6], modrm: XMM_MEM, imm: 8, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xc6], modrm: XMM_RR, imm: 8, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xc6], modrm: XMM_MEM, imm: 8, ..D });

    let mut g = fam(forms, "psllq");
    g.f(F { opcode: vec![0x0f, 0x73], modrm: DIGIT_RM6, imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x73], modrm: DIGIT_RM6, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x73], modrm: DIGIT_RM6, imm: 8, ..D });

    // converts
    let mut g = fam(forms, "cvtsi2ss");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x2a], modrm: RR, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x2a], modrm: MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x2a], modrm: RR, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x2a], modrm: MEM, ..D });

    let mut g = fam(forms, "cvttss2si");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x2c], modrm: RR, ..D });
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x2c], modrm: MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 0RXB", opcode: vec![0x0f, 0x2c], modrm: RR, ..D });
    g.f(F { prefix: F3, rex: "0100 10XB", opcode: vec![0x0f, 0x2c], modrm: RR, no_reg: NO_RSP, ..D });
    g.f(F { prefix: F3, rex: "0100 11XB", opcode: vec![0x0f, 0x2c], modrm: RR, ..D });
    g.f(F { prefix: F3, rex: "0100 0RXB", opcode: vec![0x0f, 0x2c], modrm: MEM, ..D });
    g.f(F { prefix: F3, rex: "0100 10XB", opcode: vec![0x0f, 0x2c], modrm: MEM, no_reg: NO_RSP, ..D });
    g.f(F { prefix: F3, rex: "0100 11XB", opcode: vec![0x0f, 0x2c], modrm: MEM, ..D });

    let mut g = fam(forms, "cvttsd2si");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x2c], modrm: RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x2c], modrm: MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x2c], modrm: RR, no_reg: NO_RSP, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x2c], modrm: MEM, no_reg: NO_RSP, ..D });

    let mut g = fam(forms, "cvtsi2sd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x2a], modrm: RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x2a], modrm: MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x2a], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x2a], modrm: MEM, ..D });

    let mut g = fam(forms, "cvtss2sd");
    g.f(F { prefix: F3, opcode: vec![0x0f, 0x5a], modrm: RR, ..D });
    g.f(F { prefix: F3, rex: "0100 WRXB", opcode: vec![0x0f, 0x5a], modrm: RR, ..D });

    let mut g = fam(forms, "cvtsd2ss");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x5a], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x5a], modrm: RR, ..D });

    let mut g = fam(forms, "cvtsd2si");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x2d], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x2d], modrm: RR, no_reg: NO_RSP, ..D });

    // scalar double arithmetic
    let mut g = fam(forms, "addsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x58], modrm: RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x58], modrm: MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x58], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x58], modrm: MEM, ..D });

    let mut g = fam(forms, "subsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x5c], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x5c], modrm: RR, ..D });

    let mut g = fam(forms, "mulsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x59], modrm: RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x59], modrm: MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x59], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x59], modrm: MEM, ..D });

    let mut g = fam(forms, "divsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x5e], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x5e], modrm: RR, ..D });

    for (name, op) in [("andpd", 0x54u8), ("orpd", 0x56), ("xorpd", 0x57)] {
        let mut g = fam(forms, name);
        g.f(F { prefix: OSIZE, opcode: vec![0x0f, op], modrm: RR, ..D });
        g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, op], modrm: RR, ..D });
    }

    let mut g = fam(forms, "sqrtsd");
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x51], modrm: RR, ..D });
    g.f(F { prefix: F2, opcode: vec![0x0f, 0x51], modrm: MEM, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x51], modrm: RR, ..D });
    g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0x51], modrm: MEM, ..D });

    let mut g = fam(forms, "ucomisd");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x2e], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x2e], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x2e], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x2e], modrm: MEM, ..D });

    // cmpsd with its eight fixed predicates as trailing literals
    let mut g = fam(forms, "cmpsd");
    for pred in 0u8..8 {
        g.f(F { prefix: F2, opcode: vec![0x0f, 0xc2], modrm: RR, extra: vec![pred], ..D });
    }
    for pred in 0u8..8 {
        g.f(F { prefix: F2, rex: "0100 WRXB", opcode: vec![0x0f, 0xc2], modrm: RR, extra: vec![pred], ..D });
    }

    let mut g = fam(forms, "roundsd");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x3a, 0x0b], modrm: RR, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x3a, 0x0b], modrm: RR, imm: 8, ..D });

    let mut g = fam(forms, "extractps");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0x3a, 0x17], modrm: RR, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0x3a, 0x17], modrm: RR, imm: 8, ..D });
}

const DIGIT_RM6: &str = "11 110 r/m";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::BuildResult;

    #[test]
    fn scalar_double_forms_carry_f2() {
        let mut forms = Vec::new();
        register(&mut forms);
        forms.retain(|f| f.mnemonic == "addsd");
        let records: Vec<_> = Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        assert!(records.iter().all(|r| r.to_string().starts_with("f2")));
        assert!(records.iter().any(|r| r.to_string() == "f2 0f 58 c0:"));
    }

    #[test]
    fn cmpsd_predicates_are_literal_bytes() {
        let mut forms = Vec::new();
        register(&mut forms);
        forms.retain(|f| f.mnemonic == "cmpsd");
        let records: Vec<_> = Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        assert!(records.iter().any(|r| r.to_string() == "f2 0f c2 c0 00:"));
        assert!(records.iter().any(|r| r.to_string() == "f2 0f c2 c0 07:"));
    }
}

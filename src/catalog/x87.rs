// Catalog data for the x87 subset. Most entries are two-byte stack-relative forms
// where the second byte selects st(i); those run as eight-step ladders. The
// load/store families (fld, fstp, fild, fist) add ModRM memory forms, with the
// address-size override on the store directions.

use super::{fam, Fam, InstForm, ASIZE, D, DIGIT_MEM, F};

/// Eight stack-register variants: `first second+0` .. `first second+7`.
fn ladder(g: &mut Fam<'_>, first: u8, second: u8) {
    for st in 0..8 {
        g.f(F { opcode: vec![first, second + st], ..D });
    }
}

pub fn register(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "fabs");
    g.f(F { opcode: vec![0xd9, 0xe1], ..D });
    let mut g = fam(forms, "fchs");
    g.f(F { opcode: vec![0xd9, 0xe0], ..D });

    let mut g = fam(forms, "fmul");
    ladder(&mut g, 0xdc, 0xc8);
    let mut g = fam(forms, "fsub");
    ladder(&mut g, 0xdc, 0xe8);
    g.f(F { opcode: vec![0xda], modrm: DIGIT_MEM[4], ..D }); // fisub m32
    let mut g = fam(forms, "fadd");
    ladder(&mut g, 0xdc, 0xc0);
    let mut g = fam(forms, "faddp");
    ladder(&mut g, 0xde, 0xc0);
    let mut g = fam(forms, "fsubp");
    ladder(&mut g, 0xde, 0xe8);
    let mut g = fam(forms, "fsubrp");
    ladder(&mut g, 0xde, 0xe0);
    let mut g = fam(forms, "fmulp");
    ladder(&mut g, 0xde, 0xc8);
    let mut g = fam(forms, "fdiv");
    ladder(&mut g, 0xdc, 0xf8);
    let mut g = fam(forms, "fdivp");
    ladder(&mut g, 0xde, 0xf8);
    let mut g = fam(forms, "fxch");
    ladder(&mut g, 0xd9, 0xc8);
    let mut g = fam(forms, "ffree");
    ladder(&mut g, 0xdd, 0xc0);
    let mut g = fam(forms, "fucomp");
    ladder(&mut g, 0xdd, 0xe8);
    let mut g = fam(forms, "fucomi");
    ladder(&mut g, 0xdb, 0xf0);
    let mut g = fam(forms, "fucomip");
    ladder(&mut g, 0xdf, 0xe8);

    for (name, bytes) in [
        ("fprem", [0xd9u8, 0xf8u8]),
        ("fprem1", [0xd9, 0xf5]),
        ("fincstp", [0xd9, 0xf7]),
        ("ftst", [0xd9, 0xe4]),
        ("fucompp", [0xda, 0xe9]),
        ("fcompp", [0xde, 0xd9]),
        ("fnstsw", [0xdf, 0xe0]),
        ("fnclex", [0xdb, 0xe2]),
        ("fsin", [0xd9, 0xfe]),
        ("fcos", [0xd9, 0xff]),
        ("fptan", [0xd9, 0xf2]),
        ("fyl2x", [0xd9, 0xf1]),
        ("f2xm1", [0xd9, 0xf0]),
        ("fscale", [0xd9, 0xfd]),
        ("fninit", [0xdb, 0xe3]),
        ("frndint", [0xd9, 0xfc]),
    ] {
        let mut g = fam(forms, name);
        g.f(F { opcode: bytes.to_vec(), ..D });
    }

    // fld1 .. fldz constants
    let mut g = fam(forms, "fldx");
    for second in 0xe8..0xef {
        g.f(F { opcode: vec![0xd9, second], ..D });
    }

    let mut g = fam(forms, "fld");
    g.f(F { opcode: vec![0xd9], modrm: DIGIT_MEM[0], ..D });
    g.f(F { opcode: vec![0xdd], modrm: DIGIT_MEM[0], ..D });
    ladder(&mut g, 0xd9, 0xc0);
    g.f(F { rex: "0100 WRXB", opcode: vec![0xd9], modrm: DIGIT_MEM[0], ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0xdd], modrm: DIGIT_MEM[0], ..D });

    let mut g = fam(forms, "fstp");
    g.f(F { prefix: ASIZE, opcode: vec![0xd9], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdd], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xd9], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdd], modrm: DIGIT_MEM[3], ..D });
    ladder(&mut g, 0xdd, 0xd0);
    ladder(&mut g, 0xdd, 0xd8);
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xd9], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdd], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xd9], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdd], modrm: DIGIT_MEM[3], ..D });

    let mut g = fam(forms, "fild");
    g.f(F { opcode: vec![0xdf], modrm: DIGIT_MEM[0], ..D });
    g.f(F { opcode: vec![0xdb], modrm: DIGIT_MEM[0], ..D });
    g.f(F { opcode: vec![0xdf], modrm: DIGIT_MEM[5], ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0xdf], modrm: DIGIT_MEM[0], ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0xdb], modrm: DIGIT_MEM[0], ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0xdf], modrm: DIGIT_MEM[5], ..D });

    let mut g = fam(forms, "fist");
    g.f(F { prefix: ASIZE, opcode: vec![0xdf], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdb], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdf], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdb], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xdf], modrm: DIGIT_MEM[7], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdf], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdb], modrm: DIGIT_MEM[2], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdf], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdb], modrm: DIGIT_MEM[3], ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0xdf], modrm: DIGIT_MEM[7], ..D });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::BuildResult;

    #[test]
    fn ladders_cover_all_stack_slots() {
        let mut forms = Vec::new();
        register(&mut forms);
        forms.retain(|f| f.mnemonic == "fadd");
        let records: Vec<_> = Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0].to_string(), "dc c0:");
        assert_eq!(records[7].to_string(), "dc c7:");
    }
}

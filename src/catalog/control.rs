// Catalog data for every control-transfer form the sandbox sanctions. Plain
// relative jumps, conditional jumps and the direct call are single instructions
// carrying their own accept class. Indirect transfers are only legal as fixed
// multi-instruction idioms, assembled here token by token: the masked jump/call
// idioms canonicalize the target register, compare the byte at the target against
// the guard value and retry on mismatch before transferring; the MCFI idioms load
// the bary-table id, compare it against the target id and fall into a trap on
// check failure. The jne displacement inside the check idioms is an interior
// wildcard: its value is patched at runtime and the verifier does not constrain it.

use super::{fam_class, InstForm, D, F};
use crate::encoding::{AcceptClass, Pattern, Token};

/// Guard byte expected at every legal indirect-transfer target.
const GUARD: u8 = 0xf4;

fn lit(out: &mut Vec<Token>, bytes: &[u8]) {
    out.extend(bytes.iter().map(|&b| Token::Byte(b)));
}

fn wild(out: &mut Vec<Token>, count: usize) {
    out.extend(std::iter::repeat(Token::Any).take(count));
}

pub fn register(forms: &mut Vec<InstForm>) {
    let mut g = fam_class(forms, "jmp", AcceptClass::JmpRel1);
    g.f(F { opcode: vec![0xeb], imm: 8, ..D });
    let mut g = fam_class(forms, "jmp", AcceptClass::JmpRel4);
    g.f(F { opcode: vec![0xe9], imm: 32, ..D });

    let mut g = fam_class(forms, "jcc", AcceptClass::JccRel1);
    g.f(F { opcode_tpl: "0111 tnnn", imm: 8, ..D });
    let mut g = fam_class(forms, "jcc", AcceptClass::JccRel4);
    g.f(F { opcode_tpl: "0000 1111 1000 tnnn", imm: 32, ..D });

    let mut g = fam_class(forms, "call", AcceptClass::DCall);
    g.f(F { opcode: vec![0xe8], imm: 32, ..D });

    masked_indirect(forms, "ijmp", AcceptClass::IJmp, 0xe0);
    masked_indirect(forms, "icall", AcceptClass::ICall, 0xd0);
    mcfi_call(forms);
    mcfi_check(forms);
    mcfi_ret(forms);
}

/// The masked indirect jump/call idiom:
/// canonicalize the register, `cmpb $GUARD, %gs:(reg)`, `jne -3`, transfer.
/// `target_base` selects the ff-group modrm row (e0 for jmp, d0 for call).
fn masked_indirect(
    forms: &mut Vec<InstForm>,
    name: &'static str,
    class: AcceptClass,
    target_base: u8,
) {
    let mut g = fam_class(forms, name, class);
    // register-direct modrm bytes of the canonicalizing mov, rax..rdi
    const MOV_RM: [u8; 8] = [0xc0, 0xc9, 0xd2, 0xdb, 0xe4, 0xed, 0xf6, 0xff];
    // cmpb addressing for each register; rsp and rbp need a SIB/disp8 form
    const CMP_RM: [&[u8]; 8] = [
        &[0x38],
        &[0x39],
        &[0x3a],
        &[0x3b],
        &[0x3c, 0x24],
        &[0x7d, 0x00],
        &[0x3e],
        &[0x3f],
    ];
    const JNE_BACK: [u8; 3] = [0x2e, 0x75, 0xfd];

    // r8..r15 via REX.RB
    for target in 0..8u8 {
        for mov_op in [0x89u8, 0x8b] {
            for rm in MOV_RM {
                let mut seq = Vec::new();
                lit(&mut seq, &[0x45, mov_op, rm]);
                lit(&mut seq, &[0x65, 0x41, 0x80]);
                lit(&mut seq, CMP_RM[target as usize]);
                lit(&mut seq, &[GUARD]);
                lit(&mut seq, &JNE_BACK);
                lit(&mut seq, &[0x41, 0xff, target_base + target]);
                g.fixed(Pattern(seq));
            }
        }
    }
    // rax..rdi
    for target in 0..8u8 {
        for mov_op in [0x89u8, 0x8b] {
            for rm in MOV_RM {
                let mut seq = Vec::new();
                lit(&mut seq, &[mov_op, rm]);
                lit(&mut seq, &[0x65, 0x80]);
                lit(&mut seq, CMP_RM[target as usize]);
                lit(&mut seq, &[GUARD]);
                lit(&mut seq, &JNE_BACK);
                lit(&mut seq, &[0xff, target_base + target]);
                g.fixed(Pattern(seq));
            }
        }
    }
}

/// jne-to-check encodings: rel32 or rel8, displacement unconstrained.
fn jne_check(out: &mut Vec<Token>, wide: bool) {
    if wide {
        lit(out, &[0x0f, 0x85]);
        wild(out, 4);
    } else {
        lit(out, &[0x75]);
        wild(out, 1);
    }
}

/// Alignment padding admitted between the id check and the transfer.
const ALIGN_NOPS: [&[u8]; 8] = [
    &[],
    &[0x90],
    &[0x66, 0x90],
    &[0x0f, 0x1f, 0x00],
    &[0x0f, 0x1f, 0x40, 0x00],
    &[0x0f, 0x1f, 0x44, 0x00, 0x00],
    &[0x66, 0x0f, 0x1f, 0x44, 0x00, 0x00],
    &[0x0f, 0x1f, 0x80, 0x00, 0x00, 0x00, 0x00],
];

/// The MCFI guarded indirect call through rax or rbx: canonicalize the target,
/// load the bary id from its %gs slot, compare against the id at the target,
/// jne to the check stub, optional alignment nop, then call.
fn mcfi_call(forms: &mut Vec<InstForm>) {
    let mut g = fam_class(forms, "mcficall", AcceptClass::McfiCall);
    const MOV_BID: [u8; 9] = [0x65, 0x4c, 0x8b, 0x14, 0x25, 0x00, 0x00, 0x00, 0x00];
    const CMPQ: [[u8; 4]; 2] = [[0x65, 0x4c, 0x39, 0x10], [0x65, 0x4c, 0x39, 0x13]];
    const CALLR: [[u8; 2]; 2] = [[0xff, 0xd0], [0xff, 0xd3]];

    for reg in 0..2usize {
        for mov_rm in [0xc0u8, 0xdb] {
            for mov_op in [0x89u8, 0x8b] {
                for nop in ALIGN_NOPS {
                    for wide in [true, false] {
                        let mut seq = Vec::new();
                        lit(&mut seq, &[mov_op, mov_rm]);
                        lit(&mut seq, &MOV_BID);
                        lit(&mut seq, &CMPQ[reg]);
                        jne_check(&mut seq, wide);
                        lit(&mut seq, nop);
                        lit(&mut seq, &CALLR[reg]);
                        g.fixed(Pattern(seq));
                    }
                }
            }
        }
    }
}

/// The MCFI check stub: load the target id, test the low bit, je to the trap,
/// compare ids, jne back to retry, halt on failure.
fn mcfi_check(forms: &mut Vec<InstForm>) {
    let mut g = fam_class(forms, "mcficheck", AcceptClass::McfiCheck);
    const MOV_TID: [[u8; 4]; 2] = [[0x65, 0x4c, 0x8b, 0x18], [0x65, 0x4c, 0x8b, 0x1b]];
    const TESTB: [u8; 4] = [0x41, 0xf6, 0xc3, 0x01];
    const CMPL: [[u8; 3]; 2] = [[0x45, 0x39, 0xd3], [0x45, 0x3b, 0xd3]];
    // je skips over the wide or narrow jne that follows
    const JE_HLT: [[u8; 2]; 2] = [[0x74, 0x09], [0x74, 0x05]];

    for mov_tid in MOV_TID {
        for cmpl in CMPL {
            for (i, wide) in [true, false].into_iter().enumerate() {
                let mut seq = Vec::new();
                lit(&mut seq, &mov_tid);
                lit(&mut seq, &TESTB);
                lit(&mut seq, &JE_HLT[i]);
                lit(&mut seq, &cmpl);
                jne_check(&mut seq, wide);
                lit(&mut seq, &[GUARD]);
                g.fixed(Pattern(seq));
            }
        }
    }
}

/// The MCFI guarded return through rcx.
fn mcfi_ret(forms: &mut Vec<InstForm>) {
    let mut g = fam_class(forms, "mcfiret", AcceptClass::McfiRet);
    const MOV_BID: [u8; 9] = [0x65, 0x48, 0x8b, 0x3c, 0x25, 0x00, 0x00, 0x00, 0x00];
    const MOV_TID: [u8; 4] = [0x65, 0x48, 0x8b, 0x31];
    const TAIL: [u8; 2] = [0x75, 0x02]; // jne over the jmp
    const JMPR: [u8; 2] = [0xff, 0xe1];
    const TESTB: [u8; 4] = [0x40, 0xf6, 0xc6, 0x01];
    const JE_HLT: [u8; 2] = [0x74, 0x04];
    const JNE_TRY: [u8; 2] = [0x75, 0xe1];

    for mov_rm in [0x89u8, 0x8b] {
        for cmpq in [[0x48u8, 0x39, 0xfe], [0x48, 0x8b, 0xfe]] {
            for cmpl in [[0x39u8, 0xfe], [0x3b, 0xfe]] {
                let mut seq = Vec::new();
                lit(&mut seq, &[mov_rm, 0xc9]); // movl %ecx, %ecx
                lit(&mut seq, &MOV_BID);
                lit(&mut seq, &MOV_TID);
                lit(&mut seq, &cmpq);
                lit(&mut seq, &TAIL);
                lit(&mut seq, &JMPR);
                lit(&mut seq, &TESTB);
                lit(&mut seq, &JE_HLT);
                lit(&mut seq, &cmpl);
                lit(&mut seq, &JNE_TRY);
                lit(&mut seq, &[GUARD]);
                g.fixed(Pattern(seq));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::encoding::Record;
    use crate::error::BuildResult;

    fn records() -> Vec<Record> {
        let mut forms = Vec::new();
        register(&mut forms);
        Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<_>>()
            .unwrap()
    }

    #[test]
    fn relative_jumps_and_calls() {
        let recs = records();
        let texts: Vec<String> = recs.iter().map(|r| r.to_string()).collect();
        assert!(texts.contains(&"eb XX:jmp_rel1".to_string()));
        assert!(texts.contains(&"e9 XX XX XX XX:jmp_rel4".to_string()));
        assert!(texts.contains(&"e8 XX XX XX XX:dcall".to_string()));
        assert!(texts.contains(&"74 XX:jcc_rel1".to_string()));
        assert!(texts.contains(&"0f 85 XX XX XX XX:jcc_rel4".to_string()));
    }

    #[test]
    fn idiom_fanout_matches_construction() {
        let recs = records();
        let count = |c: AcceptClass| recs.iter().filter(|r| r.class == c).count();
        // 8 targets x 2 mov opcodes x 8 canonicalizations, extended + legacy
        assert_eq!(count(AcceptClass::IJmp), 256);
        assert_eq!(count(AcceptClass::ICall), 256);
        // 2 call regs x 2 mov modrms x 2 mov opcodes x 8 nops x 2 jne widths
        assert_eq!(count(AcceptClass::McfiCall), 128);
        assert_eq!(count(AcceptClass::McfiCheck), 8);
        assert_eq!(count(AcceptClass::McfiRet), 8);
    }

    #[test]
    fn icall_idiom_shape() {
        let recs = records();
        let sample = recs
            .iter()
            .find(|r| r.class == AcceptClass::ICall && r.to_string().starts_with("89 c0"))
            .unwrap();
        assert_eq!(
            sample.to_string(),
            "89 c0 65 80 38 f4 2e 75 fd ff d0:icall"
        );
    }

    #[test]
    fn mcfi_idioms_end_in_transfer_or_trap() {
        for r in records() {
            match r.class {
                AcceptClass::McfiCheck | AcceptClass::McfiRet => {
                    assert_eq!(*r.pattern.0.last().unwrap(), Token::Byte(GUARD));
                }
                AcceptClass::McfiCall => {
                    let last = r.pattern.0.last().unwrap();
                    assert!(matches!(last, Token::Byte(0xd0) | Token::Byte(0xd3)));
                }
                _ => {}
            }
        }
    }
}

// Catalog data for the move family and its relatives: mov in all its forms
// (including the opcode-register immediate forms, imm64 loads and the rax moffs64
// forms), conditional moves, setcc, zero/sign extension, lea, push and pop. The
// opcode-register encodings use byte templates with the register folded into the
// low bits; pop rsp and xchg-style rsp shortcuts are excluded where the sandbox
// bans rsp as a target.

use super::{fam, InstForm, ASIZE, ASIZE_OSIZE, D, DIGIT_MEM, DIGIT_REG, F, OSIZE};
use crate::addressing::NO_RSP;

const RR: &str = "11 reg1 reg2";
const MEM: &str = "mod reg r/m";

pub fn register(forms: &mut Vec<InstForm>) {
    mov(forms);
    cmov(forms);
    setcc(forms);
    movzx(forms);
    movsx(forms);
    lea(forms);
    push(forms);
    pop(forms);
}

fn mov(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "mov");
    // register to register, both directions
    g.f(F { opcode: vec![0x88], modrm: RR, ..D });
    g.f(F { opcode: vec![0x89], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x89], modrm: RR, ..D });
    g.f(F { opcode: vec![0x8a], modrm: RR, ..D });
    g.f(F { opcode: vec![0x8b], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x8b], modrm: RR, ..D });
    // memory to register
    g.f(F { opcode: vec![0x8a], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x8b], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x8b], modrm: MEM, ..D });
    // register to memory
    g.f(F { prefix: ASIZE, opcode: vec![0x88], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x89], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x89], modrm: MEM, ..D });
    // immediate to register
    g.f(F { opcode: vec![0xc6], modrm: DIGIT_REG[0], imm: 8, ..D });
    g.f(F { opcode: vec![0xc7], modrm: DIGIT_REG[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xc7], modrm: DIGIT_REG[0], imm: 16, ..D });
    // immediate to register, opcode-register form
    g.f(F { opcode_tpl: "1011 0reg", imm: 8, ..D });
    g.f(F { opcode_tpl: "1011 1reg", imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: "1011 1reg", imm: 16, ..D });
    // immediate to memory
    g.f(F { prefix: ASIZE, opcode: vec![0xc6], modrm: DIGIT_MEM[0], imm: 8, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xc7], modrm: DIGIT_MEM[0], imm: 32, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0xc7], modrm: DIGIT_MEM[0], imm: 16, ..D });

    // 64-bit
    g.f(F { rex: "0100 0R0B", opcode: vec![0x88], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x89], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x89], modrm: RR, ..D });
    g.f(F { rex: "0100 1R00", opcode: vec![0x89], modrm: RR, no_rm: NO_RSP, ..D });
    g.f(F { rex: "0100 1R01", opcode: vec![0x89], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x8a], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x8b], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x8b], modrm: RR, ..D });
    g.f(F { rex: "0100 100B", opcode: vec![0x8b], modrm: RR, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 110B", opcode: vec![0x8b], modrm: RR, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x8a], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x8b], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x8b], modrm: MEM, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0x8b], modrm: MEM, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 11XB", opcode: vec![0x8b], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 0RXB", opcode: vec![0x88], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 0RXB", opcode: vec![0x89], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 0RXB", opcode: vec![0x89], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 1RXB", opcode: vec![0x89], modrm: MEM, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xc6], modrm: DIGIT_REG[0], imm: 8, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xc7], modrm: DIGIT_REG[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xc7], modrm: DIGIT_REG[0], imm: 16, ..D });
    // immediate32 to qwordregister, zero extending
    g.f(F { rex: "0100 1000", opcode: vec![0xc7], modrm: DIGIT_REG[0], no_rm: NO_RSP, imm: 32, ..D });
    g.f(F { rex: "0100 1001", opcode: vec![0xc7], modrm: DIGIT_REG[0], imm: 32, ..D });
    // opcode-register immediates; the imm64 loads skip rsp (0xbc)
    g.f(F { prefix: &[0x48], opcode_tpl: "1011 0reg", imm: 8, ..D });
    g.f(F { prefix: &[0x49], opcode_tpl: "1011 0reg", imm: 8, ..D });
    g.f(F { prefix: &[0x48], opcode_tpl: "1011 1reg", no_opcode: &[0xbc], imm: 64, ..D });
    g.f(F { prefix: &[0x49], opcode_tpl: "1011 1reg", imm: 64, ..D });
    g.f(F { rex: "0100 000B", opcode_tpl: "1011 1reg", imm: 32, ..D });
    // immediate to memory
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xc6], modrm: DIGIT_MEM[0], imm: 8, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xc7], modrm: DIGIT_MEM[0], imm: 32, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 00XB", opcode: vec![0xc7], modrm: DIGIT_MEM[0], imm: 16, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 10XB", opcode: vec![0xc7], modrm: DIGIT_MEM[0], imm: 32, ..D });
    // moffs64 to/from rax
    g.f(F { rex: "0100 1000", opcode: vec![0xa1], imm: 64, ..D });
    g.f(F { rex: "0100 1000", opcode: vec![0xa3], imm: 64, ..D });
}

fn cmov(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "cmov");
    const TPL: &str = "0000 1111 0100 tnnn";
    g.f(F { opcode_tpl: TPL, modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: TPL, modrm: RR, ..D });
    g.f(F { opcode_tpl: TPL, modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: TPL, modrm: MEM, ..D });

    g.f(F { rex: "0100 0RXB", opcode_tpl: TPL, modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode_tpl: TPL, modrm: RR, ..D });
    g.f(F { rex: "0100 10XB", opcode_tpl: TPL, modrm: RR, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 11XB", opcode_tpl: TPL, modrm: RR, ..D });
    g.f(F { rex: "0100 0RXB", opcode_tpl: TPL, modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode_tpl: TPL, modrm: MEM, ..D });
    g.f(F { rex: "0100 10XB", opcode_tpl: TPL, modrm: MEM, no_reg: NO_RSP, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 11XB", opcode_tpl: TPL, modrm: MEM, ..D });
}

fn setcc(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "setcc");
    g.f(F { opcode_tpl: "0000 1111 1001 tttn", modrm: RR, ..D });
    g.f(F { rex: "0100 000B", opcode_tpl: "0000 1111 1001 tttn", modrm: RR, ..D });
}

fn movzx(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "movzx");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xb6], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xb6], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xb7], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xb6], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xb6], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xb7], modrm: MEM, ..D });

    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x0f, 0xb6], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x0f, 0xb6], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x0f, 0xb7], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x0f, 0xb6], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x0f, 0xb7], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xb6], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xb6], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xb7], modrm: MEM, ..D });
}

fn movsx(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "movsx");
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xbe], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xbe], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xbf], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xbe], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xbe], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xbf], modrm: MEM, ..D });

    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x0f, 0xbe], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x0f, 0xbe], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x0f, 0xbf], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x0f, 0xbe], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x0f, 0xbf], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xbe], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xbe], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xbf], modrm: MEM, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x0f, 0xbe], modrm: MEM, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x0f, 0xbf], modrm: MEM, ..D });
    // movsxd
    g.f(F { rex: "0100 1R0B", opcode: vec![0x63], modrm: RR, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x63], modrm: MEM, ..D });
}

fn lea(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "lea");
    g.f(F { opcode: vec![0x8d], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x8d], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x8d], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x8d], modrm: MEM, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0x8d], modrm: MEM, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 11XB", opcode: vec![0x8d], modrm: MEM, ..D });
}

fn push(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "push");
    g.f(F { opcode: vec![0xff], modrm: DIGIT_REG[6], ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xff], modrm: DIGIT_REG[6], ..D });
    g.f(F { opcode_tpl: "0101 0reg", ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: "0101 0reg", ..D });
    g.f(F { opcode: vec![0xff], modrm: DIGIT_MEM[6], ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xff], modrm: DIGIT_MEM[6], ..D });
    g.f(F { opcode: vec![0x6a], imm: 8, ..D });
    g.f(F { opcode: vec![0x68], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x68], imm: 16, ..D });

    g.f(F { rex: "0100 W00B", opcode: vec![0xff], modrm: DIGIT_REG[6], ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xff], modrm: DIGIT_REG[6], ..D });
    g.f(F { rex: "0100 W00B", opcode_tpl: "0101 0reg", ..D });
    g.f(F { rex: "0100 W00B", opcode: vec![0xff], modrm: DIGIT_MEM[6], ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xff], modrm: DIGIT_MEM[6], ..D });
}

fn pop(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "pop");
    g.f(F { opcode: vec![0x8f], modrm: DIGIT_REG[0], ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x8f], modrm: DIGIT_REG[0], ..D });
    g.f(F { opcode_tpl: "0101 1reg", ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: "0101 1reg", ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x8f], modrm: DIGIT_MEM[0], ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x8f], modrm: DIGIT_MEM[0], ..D });

    g.f(F { rex: "0100 W000", opcode: vec![0x8f], modrm: DIGIT_REG[0], no_rm: NO_RSP, ..D });
    g.f(F { rex: "0100 W001", opcode: vec![0x8f], modrm: DIGIT_REG[0], ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0x8f], modrm: DIGIT_REG[0], ..D });
    // pop rsp is excluded
    g.f(F { rex: "0100 W000", opcode_tpl: "0101 1reg", no_opcode: &[0x5c], ..D });
    g.f(F { rex: "0100 W001", opcode_tpl: "0101 1reg", ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0x8f], modrm: DIGIT_MEM[0], ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 00XB", opcode: vec![0x8f], modrm: DIGIT_MEM[0], ..D });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::BuildResult;

    fn records_of(name: &str) -> Vec<String> {
        let mut forms = Vec::new();
        register(&mut forms);
        forms.retain(|f| f.mnemonic == name);
        Catalog::from_forms(forms)
            .records()
            .collect::<BuildResult<Vec<_>>>()
            .unwrap()
            .into_iter()
            .map(|r| r.to_string())
            .collect()
    }

    #[test]
    fn mov_opcode_register_forms() {
        let recs = records_of("mov");
        // mov eax, imm32
        assert!(recs.contains(&"b8 XX XX XX XX:".to_string()));
        // mov rax, imm64
        assert!(recs.contains(&"48 b8 XX XX XX XX XX XX XX XX:".to_string()));
        // mov rsp, imm64 is banned
        assert!(!recs.contains(&"48 bc XX XX XX XX XX XX XX XX:".to_string()));
    }

    #[test]
    fn setcc_covers_all_condition_codes() {
        let recs = records_of("setcc");
        // 16 condition codes x 64 modrm values, 32- and 64-bit variants
        assert!(recs.contains(&"0f 94 c0:".to_string()));
        assert!(recs.contains(&"0f 9f ff:".to_string()));
        assert_eq!(recs.len(), 16 * 64 + 2 * 16 * 64);
    }

    #[test]
    fn pop_rsp_shortcut_is_excluded() {
        let recs = records_of("pop");
        assert!(!recs.contains(&"48 5c:".to_string()));
        assert!(recs.contains(&"48 5d:".to_string()));
        assert!(recs.contains(&"49 5c:".to_string()));
    }
}

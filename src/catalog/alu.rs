// Catalog data for the two-operand ALU family (add, or, sbb, and, sub, xor, cmp),
// the fe/ff and f6/f7 unary groups, rotates and shifts, test, xchg, the bit-test
// group and the string-move idiom. The seven ALU ops share one encoding shape, so a
// single routine stamps it out per op; the variation points are the opcode base, the
// accumulator shortcut opcode, the /digit of the 80-group immediate forms, and
// whether the op writes its destination. Destructive ops take the address-size
// prefix on their memory-destination forms and exclude rsp as a 64-bit target; cmp
// reads only and takes neither. Sign-extended imm8-to-qwordreg forms apply the rsp
// exclusion uniformly across the destructive ops.

use super::{fam, InstForm, ASIZE, ASIZE_OSIZE, D, DIGIT_MEM, DIGIT_REG, F, OSIZE};
use crate::addressing::NO_RSP;

const RR: &str = "11 reg1 reg2";
const MEM: &str = "mod reg r/m";

struct AluOp {
    name: &'static str,
    /// Base of the 00-05 style opcode block.
    base: u8,
    /// Accumulator-immediate shortcut opcode (imm8 variant).
    acc: u8,
    /// reg-field digit of the 80/81/83 immediate group.
    digit: usize,
    /// false for cmp, which never writes its r/m operand.
    writes: bool,
}

const ALU_OPS: [AluOp; 7] = [
    AluOp { name: "add", base: 0x00, acc: 0x04, digit: 0, writes: true },
    AluOp { name: "or", base: 0x08, acc: 0x0c, digit: 1, writes: true },
    AluOp { name: "sbb", base: 0x18, acc: 0x1c, digit: 3, writes: true },
    AluOp { name: "and", base: 0x20, acc: 0x24, digit: 4, writes: true },
    AluOp { name: "sub", base: 0x28, acc: 0x2c, digit: 5, writes: true },
    AluOp { name: "xor", base: 0x30, acc: 0x34, digit: 6, writes: true },
    AluOp { name: "cmp", base: 0x38, acc: 0x3c, digit: 7, writes: false },
];

pub fn register(forms: &mut Vec<InstForm>) {
    for op in &ALU_OPS {
        alu_family(forms, op);
    }
    inc_dec_group(forms, "inc", 0);
    inc_dec_group(forms, "dec", 1);
    not_neg_group(forms, "not", 2);
    not_neg_group(forms, "neg", 3);
    mul_div_group(forms, "mul", 4);
    mul_div_group(forms, "imul", 5);
    mul_div_group(forms, "div", 6);
    mul_div_group(forms, "idiv", 7);
    imul_wide(forms);
    rotate_shift(forms, "rotate", &[2, 3, 0, 1]); // rcl, rcr, rol, ror
    rotate_shift(forms, "shift", &[4, 7, 5]); // shl, sar, shr
    test(forms);
    xchg(forms);
    bit_ops(forms);
    shld_shrd(forms);
    repmovs(forms);
}

fn alu_family(forms: &mut Vec<InstForm>, op: &AluOp) {
    let mut g = fam(forms, op.name);
    let ireg = DIGIT_REG[op.digit];
    let imem = DIGIT_MEM[op.digit];
    // Memory-destination forms of destructive ops carry the address-size
    // override; cmp does not write and goes bare.
    let (mp, mpo): (&'static [u8], &'static [u8]) = if op.writes {
        (ASIZE, ASIZE_OSIZE)
    } else {
        (&[], OSIZE)
    };

    // 32-bit: register to register, both directions, plus the 16-bit variant
    g.f(F { opcode: vec![op.base], modrm: RR, ..D });
    g.f(F { opcode: vec![op.base + 1], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![op.base + 1], modrm: RR, ..D });
    g.f(F { opcode: vec![op.base + 2], modrm: RR, ..D });
    g.f(F { opcode: vec![op.base + 3], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![op.base + 3], modrm: RR, ..D });
    // memory to register
    g.f(F { opcode: vec![op.base + 2], modrm: MEM, ..D });
    g.f(F { opcode: vec![op.base + 3], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![op.base + 3], modrm: MEM, ..D });
    // register to memory
    g.f(F { prefix: mp, opcode: vec![op.base], modrm: MEM, ..D });
    g.f(F { prefix: mp, opcode: vec![op.base + 1], modrm: MEM, ..D });
    g.f(F { prefix: mpo, opcode: vec![op.base + 1], modrm: MEM, ..D });
    // immediate to register
    g.f(F { opcode: vec![0x80], modrm: ireg, imm: 8, ..D });
    g.f(F { opcode: vec![0x81], modrm: ireg, imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x81], modrm: ireg, imm: 16, ..D });
    g.f(F { opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    // immediate to al/ax/eax
    g.f(F { opcode: vec![op.acc], imm: 8, ..D });
    g.f(F { opcode: vec![op.acc + 1], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![op.acc + 1], imm: 16, ..D });
    // immediate to memory
    g.f(F { prefix: mp, opcode: vec![0x80], modrm: imem, imm: 8, ..D });
    g.f(F { prefix: mp, opcode: vec![0x81], modrm: imem, imm: 32, ..D });
    g.f(F { prefix: mpo, opcode: vec![0x81], modrm: imem, imm: 16, ..D });
    g.f(F { prefix: mp, opcode: vec![0x83], modrm: imem, imm: 8, ..D });
    g.f(F { prefix: mpo, opcode: vec![0x83], modrm: imem, imm: 8, ..D });

    // 64-bit: register to register
    g.f(F { rex: "0100 0R0B", opcode: vec![op.base], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![op.base + 1], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![op.base + 1], modrm: RR, ..D });
    if op.writes {
        // rsp is never a target register
        g.f(F { rex: "0100 1R00", opcode: vec![op.base + 1], modrm: RR, no_rm: NO_RSP, ..D });
        g.f(F { rex: "0100 1R01", opcode: vec![op.base + 1], modrm: RR, ..D });
    } else {
        g.f(F { rex: "0100 1R0B", opcode: vec![op.base + 1], modrm: RR, ..D });
    }
    g.f(F { rex: "0100 0R0B", opcode: vec![op.base + 2], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![op.base + 3], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![op.base + 3], modrm: RR, ..D });
    if op.writes {
        g.f(F { rex: "0100 100B", opcode: vec![op.base + 3], modrm: RR, no_reg: NO_RSP, ..D });
        g.f(F { rex: "0100 110B", opcode: vec![op.base + 3], modrm: RR, ..D });
    } else {
        g.f(F { rex: "0100 1R0B", opcode: vec![op.base + 3], modrm: RR, ..D });
    }
    // memory to register
    g.f(F { rex: "0100 0RXB", opcode: vec![op.base + 2], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![op.base + 3], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![op.base + 3], modrm: MEM, ..D });
    if op.writes {
        g.f(F { rex: "0100 10XB", opcode: vec![op.base + 3], modrm: MEM, no_reg: NO_RSP, ..D });
        g.f(F { rex: "0100 11XB", opcode: vec![op.base + 3], modrm: MEM, ..D });
    } else {
        g.f(F { rex: "0100 1RXB", opcode: vec![op.base + 3], modrm: MEM, ..D });
    }
    // register to memory
    g.f(F { prefix: mp, rex: "0100 0RXB", opcode: vec![op.base], modrm: MEM, ..D });
    g.f(F { prefix: mp, rex: "0100 0RXB", opcode: vec![op.base + 1], modrm: MEM, ..D });
    g.f(F { prefix: mpo, rex: "0100 0RXB", opcode: vec![op.base + 1], modrm: MEM, ..D });
    g.f(F { prefix: mp, rex: "0100 1RXB", opcode: vec![op.base + 1], modrm: MEM, ..D });
    // immediate to register
    g.f(F { rex: "0100 000B", opcode: vec![0x80], modrm: ireg, imm: 8, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0x81], modrm: ireg, imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0x81], modrm: ireg, imm: 16, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    // immediate to qwordregister
    if op.writes {
        g.f(F { rex: "0100 1000", opcode: vec![0x81], modrm: ireg, no_rm: NO_RSP, imm: 32, ..D });
        g.f(F { rex: "0100 1001", opcode: vec![0x81], modrm: ireg, imm: 32, ..D });
        g.f(F { rex: "0100 1000", opcode: vec![0x83], modrm: ireg, no_rm: NO_RSP, imm: 8, ..D });
        g.f(F { rex: "0100 1001", opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    } else {
        g.f(F { rex: "0100 100B", opcode: vec![0x81], modrm: ireg, imm: 32, ..D });
        g.f(F { rex: "0100 100B", opcode: vec![0x83], modrm: ireg, imm: 8, ..D });
    }
    // immediate to rax
    g.f(F { rex: "0100 1000", opcode: vec![op.acc + 1], imm: 32, ..D });
    // immediate to memory
    g.f(F { prefix: mp, rex: "0100 00XB", opcode: vec![0x80], modrm: imem, imm: 8, ..D });
    g.f(F { prefix: mp, rex: "0100 00XB", opcode: vec![0x81], modrm: imem, imm: 32, ..D });
    g.f(F { prefix: mpo, rex: "0100 00XB", opcode: vec![0x81], modrm: imem, imm: 16, ..D });
    g.f(F { prefix: mp, rex: "0100 10XB", opcode: vec![0x81], modrm: imem, imm: 32, ..D });
    g.f(F { prefix: mp, rex: "0100 W0XB", opcode: vec![0x83], modrm: imem, imm: 8, ..D });
}

fn inc_dec_group(forms: &mut Vec<InstForm>, name: &'static str, digit: usize) {
    let mut g = fam(forms, name);
    let reg = DIGIT_REG[digit];
    let mem = DIGIT_MEM[digit];
    g.f(F { opcode: vec![0xfe], modrm: reg, ..D });
    g.f(F { opcode: vec![0xff], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xff], modrm: reg, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xfe], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xff], modrm: mem, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0xff], modrm: mem, ..D });

    g.f(F { rex: "0100 000B", opcode: vec![0xfe], modrm: reg, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xff], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xff], modrm: reg, ..D });
    g.f(F { rex: "0100 1000", opcode: vec![0xff], modrm: reg, no_rm: NO_RSP, ..D });
    g.f(F { rex: "0100 1001", opcode: vec![0xff], modrm: reg, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xfe], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xff], modrm: mem, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 00XB", opcode: vec![0xff], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 10XB", opcode: vec![0xff], modrm: mem, ..D });
}

fn not_neg_group(forms: &mut Vec<InstForm>, name: &'static str, digit: usize) {
    let mut g = fam(forms, name);
    let reg = DIGIT_REG[digit];
    let mem = DIGIT_MEM[digit];
    g.f(F { opcode: vec![0xf6], modrm: reg, ..D });
    g.f(F { opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xf6], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0xf7], modrm: mem, ..D });

    g.f(F { rex: "0100 000B", opcode: vec![0xf6], modrm: reg, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { rex: "0100 1000", opcode: vec![0xf7], modrm: reg, no_rm: NO_RSP, ..D });
    g.f(F { rex: "0100 1001", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xf6], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 00XB", opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 00XB", opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 10XB", opcode: vec![0xf7], modrm: mem, ..D });
}

fn mul_div_group(forms: &mut Vec<InstForm>, name: &'static str, digit: usize) {
    let mut g = fam(forms, name);
    let reg = DIGIT_REG[digit];
    let mem = DIGIT_MEM[digit];
    g.f(F { opcode: vec![0xf6], modrm: reg, ..D });
    g.f(F { opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { opcode: vec![0xf6], modrm: mem, ..D });
    g.f(F { opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xf7], modrm: mem, ..D });

    g.f(F { rex: "0100 000B", opcode: vec![0xf6], modrm: reg, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { rex: "0100 100B", opcode: vec![0xf7], modrm: reg, ..D });
    g.f(F { rex: "0100 00XB", opcode: vec![0xf6], modrm: mem, ..D });
    g.f(F { rex: "0100 00XB", opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 00XB", opcode: vec![0xf7], modrm: mem, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0xf7], modrm: mem, ..D });
}

/// The two- and three-operand imul forms beyond the f6/f7 group.
fn imul_wide(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "imul");
    g.f(F { opcode: vec![0x0f, 0xaf], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xaf], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xaf], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xaf], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x6b], modrm: RR, imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x6b], modrm: RR, imm: 8, ..D });
    g.f(F { opcode: vec![0x69], modrm: RR, imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x69], modrm: RR, imm: 16, ..D });
    g.f(F { opcode: vec![0x6b], modrm: MEM, imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x6b], modrm: MEM, imm: 8, ..D });
    g.f(F { opcode: vec![0x69], modrm: MEM, imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x69], modrm: MEM, imm: 16, ..D });

    g.f(F { rex: "0100 0R0B", opcode: vec![0x0f, 0xaf], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x0f, 0xaf], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x0f, 0xaf], modrm: RR, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xaf], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xaf], modrm: MEM, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x6b], modrm: RR, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x6b], modrm: RR, imm: 8, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x69], modrm: RR, imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x69], modrm: RR, imm: 16, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x6b], modrm: RR, imm: 8, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x69], modrm: RR, imm: 32, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x6b], modrm: MEM, imm: 8, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x6b], modrm: MEM, imm: 8, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x69], modrm: MEM, imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x69], modrm: MEM, imm: 16, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x6b], modrm: MEM, imm: 8, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x69], modrm: MEM, imm: 32, ..D });
}

fn rotate_shift(forms: &mut Vec<InstForm>, name: &'static str, digits: &[usize]) {
    let mut g = fam(forms, name);
    for &d in digits {
        g.f(F { opcode: vec![0xd1], modrm: DIGIT_REG[d], ..D });
        g.f(F { opcode: vec![0xc1], modrm: DIGIT_REG[d], imm: 8, ..D });
        g.f(F { prefix: OSIZE, opcode: vec![0xd1], modrm: DIGIT_REG[d], ..D });
        g.f(F { opcode: vec![0xd3], modrm: DIGIT_REG[d], ..D });
    }
    for &d in digits {
        g.f(F { rex: "0100 0RXB", opcode: vec![0xd1], modrm: DIGIT_REG[d], ..D });
        g.f(F { rex: "0100 0RXB", opcode: vec![0xc1], modrm: DIGIT_REG[d], imm: 8, ..D });
        g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0xd1], modrm: DIGIT_REG[d], ..D });
        g.f(F { rex: "0100 1RX0", opcode: vec![0xd1], modrm: DIGIT_REG[d], no_rm: NO_RSP, ..D });
        g.f(F { rex: "0100 1RX1", opcode: vec![0xd1], modrm: DIGIT_REG[d], ..D });
        g.f(F { rex: "0100 1RX0", opcode: vec![0xc1], modrm: DIGIT_REG[d], no_rm: NO_RSP, imm: 8, ..D });
        g.f(F { rex: "0100 1RX1", opcode: vec![0xc1], modrm: DIGIT_REG[d], imm: 8, ..D });
        g.f(F { rex: "0100 0RXB", opcode: vec![0xd3], modrm: DIGIT_REG[d], ..D });
        g.f(F { rex: "0100 1RX0", opcode: vec![0xd3], modrm: DIGIT_REG[d], no_rm: NO_RSP, ..D });
        g.f(F { rex: "0100 1RX1", opcode: vec![0xd3], modrm: DIGIT_REG[d], ..D });
    }
}

fn test(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "test");
    g.f(F { opcode: vec![0x84], modrm: "11 reg reg", ..D });
    g.f(F { opcode: vec![0x85], modrm: "11 reg reg", ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x85], modrm: "11 reg reg", ..D });
    g.f(F { opcode: vec![0x84], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x85], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x85], modrm: MEM, ..D });
    g.f(F { opcode: vec![0xf6], modrm: DIGIT_REG[0], imm: 8, ..D });
    g.f(F { opcode: vec![0xf7], modrm: DIGIT_REG[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xf7], modrm: DIGIT_REG[0], imm: 16, ..D });
    g.f(F { opcode: vec![0xa8], imm: 8, ..D });
    g.f(F { opcode: vec![0xa9], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xa9], imm: 16, ..D });
    g.f(F { opcode: vec![0xf6], modrm: DIGIT_MEM[0], imm: 8, ..D });
    g.f(F { opcode: vec![0xf7], modrm: DIGIT_MEM[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0xf7], modrm: DIGIT_MEM[0], imm: 16, ..D });

    g.f(F { rex: "0100 0R0B", opcode: vec![0x84], modrm: "11 reg reg", ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x85], modrm: "11 reg reg", ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x85], modrm: "11 reg reg", ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x85], modrm: "11 reg reg", ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x84], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x85], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x85], modrm: MEM, ..D });
    g.f(F { rex: "0100 1RXB", opcode: vec![0x85], modrm: MEM, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xf6], modrm: DIGIT_REG[0], imm: 8, ..D });
    g.f(F { rex: "0100 000B", opcode: vec![0xf7], modrm: DIGIT_REG[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 000B", opcode: vec![0xf7], modrm: DIGIT_REG[0], imm: 16, ..D });
    g.f(F { rex: "0100 100B", opcode: vec![0xf7], modrm: DIGIT_REG[0], imm: 32, ..D });
    g.f(F { rex: "0100 1000", opcode: vec![0xa9], imm: 32, ..D });
    g.f(F { rex: "0100 00XB", opcode: vec![0xf6], modrm: DIGIT_MEM[0], imm: 8, ..D });
    g.f(F { rex: "0100 00XB", opcode: vec![0xf7], modrm: DIGIT_MEM[0], imm: 32, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 00XB", opcode: vec![0xf7], modrm: DIGIT_MEM[0], imm: 16, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0xf7], modrm: DIGIT_MEM[0], imm: 32, ..D });
}

fn xchg(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "xchg");
    g.f(F { opcode: vec![0x86], modrm: RR, ..D });
    g.f(F { opcode: vec![0x87], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x87], modrm: RR, ..D });
    // ax/eax with reg, opcode-register form (0x90 doubles as nop)
    g.f(F { opcode_tpl: "1001 0reg", ..D });
    g.f(F { prefix: OSIZE, opcode_tpl: "1001 0reg", ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x86], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x87], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x87], modrm: MEM, ..D });

    g.f(F { rex: "0100 0R0B", opcode: vec![0x86], modrm: RR, ..D });
    g.f(F { rex: "0100 0R0B", opcode: vec![0x87], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0R0B", opcode: vec![0x87], modrm: RR, ..D });
    g.f(F { rex: "0100 1R0B", opcode: vec![0x87], modrm: RR, no_reg: NO_RSP, no_rm: NO_RSP, ..D });
    // rax with reg; xchg rsp is excluded
    g.f(F { prefix: &[0x48], opcode_tpl: "1001 0reg", no_opcode: &[0x94], ..D });
    g.f(F { prefix: &[0x49], opcode_tpl: "1001 0reg", ..D });
    g.f(F { prefix: ASIZE, rex: "0100 0RXB", opcode: vec![0x86], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 0RXB", opcode: vec![0x87], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 0RXB", opcode: vec![0x87], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 1RXB", opcode: vec![0x87], modrm: MEM, no_reg: NO_RSP, ..D });
}

fn bit_ops(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "bt");
    g.f(F { opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[4], imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[4], imm: 8, ..D });
    g.f(F { opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[4], imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[4], imm: 8, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[4], imm: 8, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[4], imm: 8, ..D });

    let mut g = fam(forms, "bts");
    g.f(F { opcode: vec![0x0f, 0xab], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xab], modrm: RR, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x0f, 0xab], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x0f, 0xab], modrm: MEM, ..D });
    g.f(F { opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[5], imm: 8, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[5], imm: 8, ..D });
    g.f(F { prefix: ASIZE, opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[5], imm: 8, ..D });
    g.f(F { prefix: ASIZE_OSIZE, opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[5], imm: 8, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xa3], modrm: RR, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { prefix: ASIZE_OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xa3], modrm: MEM, ..D });
    g.f(F { rex: "0100 WRXB", opcode: vec![0x0f, 0xba], modrm: DIGIT_REG[4], imm: 8, ..D });
    g.f(F { prefix: ASIZE, rex: "0100 WRXB", opcode: vec![0x0f, 0xba], modrm: DIGIT_MEM[4], imm: 8, ..D });

    let mut g = fam(forms, "bsr");
    g.f(F { opcode: vec![0x0f, 0xbd], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xbd], modrm: RR, ..D });
    g.f(F { opcode: vec![0x0f, 0xbd], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, opcode: vec![0x0f, 0xbd], modrm: MEM, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xbd], modrm: RR, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0x0f, 0xbd], modrm: RR, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 11XB", opcode: vec![0x0f, 0xbd], modrm: RR, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xbd], modrm: RR, ..D });
    g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, 0xbd], modrm: MEM, ..D });
    g.f(F { rex: "0100 10XB", opcode: vec![0x0f, 0xbd], modrm: MEM, no_reg: NO_RSP, ..D });
    g.f(F { rex: "0100 11XB", opcode: vec![0x0f, 0xbd], modrm: MEM, ..D });
    g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, 0xbd], modrm: MEM, ..D });
}

fn shld_shrd(forms: &mut Vec<InstForm>) {
    for (name, op) in [("shld", 0xa5u8), ("shrd", 0xadu8)] {
        let mut g = fam(forms, name);
        g.f(F { opcode: vec![0x0f, op], modrm: RR, ..D });
        g.f(F { prefix: OSIZE, opcode: vec![0x0f, op], modrm: RR, ..D });
        g.f(F { rex: "0100 0RXB", opcode: vec![0x0f, op], modrm: RR, ..D });
        g.f(F { prefix: OSIZE, rex: "0100 0RXB", opcode: vec![0x0f, op], modrm: RR, ..D });
        g.f(F { rex: "0100 1RX0", opcode: vec![0x0f, op], modrm: RR, no_rm: NO_RSP, ..D });
        g.f(F { rex: "0100 1RX1", opcode: vec![0x0f, op], modrm: RR, ..D });
    }
}

/// rep movs, pinned behind the `mov %edi,%edi` mask the sandbox requires.
fn repmovs(forms: &mut Vec<InstForm>) {
    let mut g = fam(forms, "repmovs");
    g.f(F { prefix: &[0x89, 0xff, 0xf3], opcode: vec![0xa4], ..D });
    g.f(F { prefix: &[0x89, 0xff, 0xf3], opcode: vec![0xa5], ..D });
    g.f(F { prefix: &[0x89, 0xff, 0xf3, 0x66], opcode: vec![0xa5], ..D });
    g.f(F { prefix: &[0x89, 0xff, 0xf3], rex: "0100 1000", opcode: vec![0xa5], ..D });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::encoding::Token;
    use crate::error::BuildResult;

    fn family(name: &str) -> Catalog {
        let mut forms = Vec::new();
        register(&mut forms);
        forms.retain(|f| f.mnemonic == name);
        Catalog::from_forms(forms)
    }

    #[test]
    fn add_register_direct_includes_canonical_form() {
        let records: Vec<_> = family("add")
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        assert!(records.iter().any(|r| r.to_string() == "01 c0:"));
        // REX.W add reg64, reg64
        assert!(records.iter().any(|r| r.to_string() == "48 01 c3:"));
    }

    #[test]
    fn rex_w_add_never_targets_rsp() {
        // Destructive 64-bit register-direct forms with REX.B clear must not
        // encode rsp as destination.
        for r in family("add").records() {
            let r = r.unwrap();
            let toks = &r.pattern.0;
            if toks.len() == 3 {
                if let (Token::Byte(rex), Token::Byte(0x01), Token::Byte(modrm)) =
                    (toks[0], toks[1], toks[2])
                {
                    if rex & 0xf9 == 0x48 && modrm >= 0xc0 {
                        assert!(
                            !(rex & 0x01 == 0 && modrm & 0b111 == 0b100),
                            "rsp target leaked: {r}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn cmp_memory_forms_take_no_address_prefix() {
        for r in family("cmp").records() {
            let r = r.unwrap();
            assert!(
                !matches!(r.pattern.0.first(), Some(Token::Byte(0x67))),
                "cmp never carries the address-size override: {r}"
            );
        }
    }

    #[test]
    fn xchg_excludes_rsp_shortcut() {
        let records: Vec<_> = family("xchg")
            .records()
            .collect::<BuildResult<_>>()
            .unwrap();
        assert!(!records
            .iter()
            .any(|r| r.to_string() == "48 94:"));
        assert!(records.iter().any(|r| r.to_string() == "48 93:"));
    }
}

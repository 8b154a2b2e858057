// This module holds the instruction catalog: the declarative listing of every
// mnemonic the sandbox accepts, expressed as raw form entries that mirror Intel's
// encoding tables (legacy prefix literal, REX template, opcode bytes or byte
// template, ModRM template with register exclusions, immediate width, trailing
// literal bytes). The catalog is pure data: building it performs no expansion and
// no global side effects; Catalog::build returns an owned value and records() lazily
// lowers each entry into typed form specs and streams out every concrete encoding.
// The family files group entries the way the reference manuals do: the ALU family,
// moves, miscellaneous one-offs, SSE/SSE2, x87, and the control-transfer idioms that
// carry the security-relevant accept classes.

//! The instruction catalog.

pub mod alu;
pub mod control;
pub mod misc;
pub mod mov;
pub mod sse;
pub mod x87;

use crate::addressing::{ModRmSpec, RegMask};
use crate::bits::BitTemplate;
use crate::encoding::{AcceptClass, FormSpec, ImmWidth, OpcodeSpec, Pattern, Record, Token};
use crate::error::{BuildError, BuildResult};

/// Address-size override; the sandbox confines data addressing to 32 bits.
pub(crate) const ASIZE: &[u8] = &[0x67];
/// Operand-size override for the 16-bit variants.
pub(crate) const OSIZE: &[u8] = &[0x66];
pub(crate) const ASIZE_OSIZE: &[u8] = &[0x67, 0x66];

/// ModRM templates pinning the reg field to an opcode-extension digit.
pub(crate) const DIGIT_REG: [&str; 8] = [
    "11 000 reg",
    "11 001 reg",
    "11 010 reg",
    "11 011 reg",
    "11 100 reg",
    "11 101 reg",
    "11 110 reg",
    "11 111 reg",
];
pub(crate) const DIGIT_MEM: [&str; 8] = [
    "mod 000 r/m",
    "mod 001 r/m",
    "mod 010 r/m",
    "mod 011 r/m",
    "mod 100 r/m",
    "mod 101 r/m",
    "mod 110 r/m",
    "mod 111 r/m",
];

/// One raw catalog entry. Unset fields keep the defaults from [`D`]; exactly
/// one of `opcode` and `opcode_tpl` must be given.
#[derive(Debug, Clone)]
pub struct F {
    pub prefix: &'static [u8],
    pub rex: &'static str,
    pub opcode: Vec<u8>,
    pub opcode_tpl: &'static str,
    /// Expansions of a single-byte `opcode_tpl` to drop (e.g. `pop rsp`).
    pub no_opcode: &'static [u8],
    pub modrm: &'static str,
    pub no_reg: RegMask,
    pub no_rm: RegMask,
    /// Immediate width in bits; 0 for none.
    pub imm: u16,
    pub extra: Vec<u8>,
}

/// The all-defaults entry, used with struct-update syntax at every call site.
pub const D: F = F {
    prefix: &[],
    rex: "",
    opcode: Vec::new(),
    opcode_tpl: "",
    no_opcode: &[],
    modrm: "",
    no_reg: 0,
    no_rm: 0,
    imm: 0,
    extra: Vec::new(),
};

#[derive(Debug, Clone)]
enum FormKind {
    Spec(F),
    Fixed(Pattern),
}

/// One catalog form: a mnemonic, its accept class and the encoding shape.
#[derive(Debug, Clone)]
pub struct InstForm {
    pub mnemonic: &'static str,
    pub class: AcceptClass,
    kind: FormKind,
}

impl InstForm {
    pub fn spec(mnemonic: &'static str, class: AcceptClass, f: F) -> Self {
        Self {
            mnemonic,
            class,
            kind: FormKind::Spec(f),
        }
    }

    /// A form whose single concrete pattern was assembled by the catalog
    /// itself (the multi-instruction control-transfer idioms).
    pub fn fixed(mnemonic: &'static str, class: AcceptClass, pattern: Pattern) -> Self {
        Self {
            mnemonic,
            class,
            kind: FormKind::Fixed(pattern),
        }
    }

    /// Lower the entry and expand it into every concrete pattern.
    pub fn patterns(&self) -> BuildResult<Box<dyn Iterator<Item = Pattern>>> {
        match &self.kind {
            FormKind::Fixed(p) => Ok(Box::new(std::iter::once(p.clone()))),
            FormKind::Spec(f) => {
                let spec = lower(f, self.mnemonic)?;
                Ok(Box::new(spec.encodings()?))
            }
        }
    }
}

fn lower(f: &F, mnemonic: &'static str) -> BuildResult<FormSpec> {
    let rex = if f.rex.is_empty() {
        None
    } else {
        Some(BitTemplate::parse(f.rex)?)
    };

    let opcode = match (f.opcode.is_empty(), f.opcode_tpl.is_empty()) {
        (false, true) => OpcodeSpec::Literal(f.opcode.iter().map(|&b| Token::Byte(b)).collect()),
        (true, false) => OpcodeSpec::Template {
            bytes: BitTemplate::parse_seq(f.opcode_tpl)?,
            forbidden: f.no_opcode.to_vec(),
        },
        _ => {
            return Err(BuildError::Form {
                mnemonic,
                reason: "exactly one of opcode and opcode_tpl must be set".to_string(),
            });
        }
    };

    let modrm = if f.modrm.is_empty() {
        None
    } else {
        Some(ModRmSpec::parse(f.modrm, f.no_reg, f.no_rm)?)
    };

    let imm = ImmWidth::from_bits(f.imm).ok_or_else(|| BuildError::Form {
        mnemonic,
        reason: format!("bad immediate width {}", f.imm),
    })?;

    Ok(FormSpec {
        prefix: f.prefix.to_vec(),
        rex,
        opcode,
        modrm,
        imm,
        extra: f.extra.clone(),
    })
}

/// Per-mnemonic entry helper used by the family files.
pub(crate) struct Fam<'a> {
    name: &'static str,
    class: AcceptClass,
    out: &'a mut Vec<InstForm>,
}

impl Fam<'_> {
    pub(crate) fn f(&mut self, spec: F) {
        self.out.push(InstForm::spec(self.name, self.class, spec));
    }

    pub(crate) fn fixed(&mut self, pattern: Pattern) {
        self.out.push(InstForm::fixed(self.name, self.class, pattern));
    }
}

pub(crate) fn fam<'a>(out: &'a mut Vec<InstForm>, name: &'static str) -> Fam<'a> {
    fam_class(out, name, AcceptClass::Ordinary)
}

pub(crate) fn fam_class<'a>(
    out: &'a mut Vec<InstForm>,
    name: &'static str,
    class: AcceptClass,
) -> Fam<'a> {
    Fam { name, class, out }
}

/// The complete, owned catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    forms: Vec<InstForm>,
}

impl Catalog {
    /// Build the full catalog.
    pub fn build() -> Self {
        let mut forms = Vec::new();
        alu::register(&mut forms);
        mov::register(&mut forms);
        misc::register(&mut forms);
        sse::register(&mut forms);
        x87::register(&mut forms);
        control::register(&mut forms);
        log::debug!("catalog holds {} forms", forms.len());
        Self { forms }
    }

    /// Assemble a catalog from an explicit form list (restricted tables,
    /// tests).
    pub fn from_forms(forms: Vec<InstForm>) -> Self {
        Self { forms }
    }

    pub fn forms(&self) -> &[InstForm] {
        &self.forms
    }

    /// Stream every concrete encoding record the catalog produces.
    pub fn records(&self) -> impl Iterator<Item = BuildResult<Record>> + '_ {
        self.forms.iter().flat_map(|form| {
            let class = form.class;
            let iter: Box<dyn Iterator<Item = BuildResult<Record>>> = match form.patterns() {
                Ok(patterns) => {
                    Box::new(patterns.map(move |pattern| Ok(Record { pattern, class })))
                }
                Err(e) => Box::new(std::iter::once(Err(e))),
            };
            iter
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_rejects_missing_opcode() {
        let form = InstForm::spec("bogus", AcceptClass::Ordinary, D);
        assert!(matches!(
            form.patterns().map(|_| ()),
            Err(BuildError::Form { mnemonic: "bogus", .. })
        ));
    }

    #[test]
    fn full_catalog_lowers_cleanly() {
        // Every entry must lower; expansion itself is exercised elsewhere.
        for form in Catalog::build().forms() {
            assert!(
                form.patterns().is_ok(),
                "form for {} failed to lower",
                form.mnemonic
            );
        }
    }

    #[test]
    fn restricted_catalog_streams_records() {
        let mut forms = Vec::new();
        let mut g = fam(&mut forms, "add");
        g.f(F {
            opcode: vec![0x01],
            modrm: "11 reg1 reg2",
            ..D
        });
        let catalog = Catalog::from_forms(forms);
        let records: Vec<_> = catalog.records().collect::<BuildResult<_>>().unwrap();
        assert_eq!(records.len(), 64);
        assert_eq!(records[0].to_string(), "01 c0:");
    }
}

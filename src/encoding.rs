// This module defines the encoding data model and the assembler that expands one
// instruction form into its complete set of concrete byte sequences. A Pattern is a
// sequence of tokens, each a literal byte or the wildcard matching all 256 values
// (immediate and displacement bytes whose content the verifier does not constrain).
// A Record pairs a pattern with its AcceptClass and round-trips through the
// line-oriented interchange format that connects the enumerator to the trie builder.
// FormSpec is one catalog form (optional legacy prefix literal, optional REX
// template, literal or templated opcode bytes, optional ModRM template, immediate
// width, trailing literal bytes); its expansion is the cartesian product of the
// component sets, produced by an odometer iterator so peak memory stays at the sum of
// the component sizes rather than their product.

//! Concrete encodings, accept classes and the form assembler.

use std::fmt;

use crate::addressing::ModRmSpec;
use crate::bits::BitTemplate;
use crate::error::{BuildError, BuildResult};

/// One byte position of an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// A literal byte value.
    Byte(u8),
    /// The wildcard: matches every byte value.
    Any,
}

/// A complete concrete byte sequence for one instruction form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pattern(pub Vec<Token>);

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tok) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match tok {
                Token::Byte(b) => write!(f, "{b:02x}")?,
                Token::Any => f.write_str("XX")?,
            }
        }
        Ok(())
    }
}

/// Security classification of a completed encoding.
///
/// `Ordinary` covers every instruction with no control-transfer role. The
/// declaration order doubles as the grouping order used when state ids are
/// assigned, with `Ordinary` first so its accept states form one contiguous
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AcceptClass {
    Ordinary,
    Terminator,
    JmpRel1,
    JmpRel4,
    JccRel1,
    JccRel4,
    DCall,
    ICall,
    IJmp,
    McfiCall,
    McfiCheck,
    McfiRet,
}

impl AcceptClass {
    /// Every class, in grouping order.
    pub const ALL: [AcceptClass; 12] = [
        AcceptClass::Ordinary,
        AcceptClass::Terminator,
        AcceptClass::JmpRel1,
        AcceptClass::JmpRel4,
        AcceptClass::JccRel1,
        AcceptClass::JccRel4,
        AcceptClass::DCall,
        AcceptClass::ICall,
        AcceptClass::IJmp,
        AcceptClass::McfiCall,
        AcceptClass::McfiCheck,
        AcceptClass::McfiRet,
    ];

    /// Classes the compiled table must be able to recognize; a catalog that
    /// produces no acceptor for one of these is unsound for the CFI scheme.
    pub const REQUIRED: [AcceptClass; 7] = [
        AcceptClass::DCall,
        AcceptClass::ICall,
        AcceptClass::JmpRel1,
        AcceptClass::JmpRel4,
        AcceptClass::McfiCall,
        AcceptClass::McfiCheck,
        AcceptClass::McfiRet,
    ];

    /// The interchange label; empty for `Ordinary`.
    pub fn label(self) -> &'static str {
        match self {
            AcceptClass::Ordinary => "",
            AcceptClass::Terminator => "terminator",
            AcceptClass::JmpRel1 => "jmp_rel1",
            AcceptClass::JmpRel4 => "jmp_rel4",
            AcceptClass::JccRel1 => "jcc_rel1",
            AcceptClass::JccRel4 => "jcc_rel4",
            AcceptClass::DCall => "dcall",
            AcceptClass::ICall => "icall",
            AcceptClass::IJmp => "ijmp",
            AcceptClass::McfiCall => "mcficall",
            AcceptClass::McfiCheck => "mcficheck",
            AcceptClass::McfiRet => "mcfiret",
        }
    }

    /// Inverse of [`AcceptClass::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Position in the grouping order.
    pub fn rank(self) -> usize {
        self as usize
    }
}

/// One interchange record: a pattern and its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub pattern: Pattern,
    pub class: AcceptClass,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pattern, self.class.label())
    }
}

impl Record {
    /// Parse one interchange line. `line_no` is used only for error reporting.
    pub fn parse(text: &str, line_no: usize) -> BuildResult<Self> {
        let text = text.trim();
        let (bytes_part, label) = text.rsplit_once(':').ok_or_else(|| BuildError::Parse {
            line: line_no,
            reason: "missing `:` class separator".to_string(),
        })?;

        let mut tokens = Vec::new();
        for tok in bytes_part.split_whitespace() {
            if tok == "XX" {
                tokens.push(Token::Any);
            } else if tok.len() <= 2 {
                let b = u8::from_str_radix(tok, 16).map_err(|_| BuildError::Parse {
                    line: line_no,
                    reason: format!("bad byte token `{tok}`"),
                })?;
                tokens.push(Token::Byte(b));
            } else {
                return Err(BuildError::Parse {
                    line: line_no,
                    reason: format!("bad byte token `{tok}`"),
                });
            }
        }
        if tokens.is_empty() {
            return Err(BuildError::Parse {
                line: line_no,
                reason: "empty byte sequence".to_string(),
            });
        }

        let class = AcceptClass::from_label(label.trim()).ok_or_else(|| {
            BuildError::UnknownClass {
                line: line_no,
                label: label.trim().to_string(),
            }
        })?;

        Ok(Self {
            pattern: Pattern(tokens),
            class,
        })
    }
}

/// Immediate operand width of a form, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImmWidth {
    #[default]
    None,
    W8,
    W16,
    W32,
    W64,
}

impl ImmWidth {
    /// Map a bit count from the catalog notation; 0 means no immediate.
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => Some(ImmWidth::None),
            8 => Some(ImmWidth::W8),
            16 => Some(ImmWidth::W16),
            32 => Some(ImmWidth::W32),
            64 => Some(ImmWidth::W64),
            _ => None,
        }
    }

    fn wildcard_bytes(self) -> usize {
        match self {
            ImmWidth::None => 0,
            ImmWidth::W8 => 1,
            ImmWidth::W16 => 2,
            ImmWidth::W32 => 4,
            ImmWidth::W64 => 8,
        }
    }
}

/// Opcode bytes of a form.
#[derive(Debug, Clone)]
pub enum OpcodeSpec {
    /// Fixed token sequence. Idiom forms embed interior wildcards here (e.g.
    /// the jne displacement inside an MCFI call sequence), so this is a token
    /// list rather than plain bytes.
    Literal(Vec<Token>),
    /// One or two templated bytes, used for opcode+register forms and the
    /// condition-code families. `forbidden` removes specific expansions of a
    /// single-byte template (e.g. `pop rsp`).
    Template {
        bytes: Vec<BitTemplate>,
        forbidden: Vec<u8>,
    },
}

/// One instruction form, fully typed. Expansion yields every concrete
/// [`Pattern`] the form may produce.
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub prefix: Vec<u8>,
    pub rex: Option<BitTemplate>,
    pub opcode: OpcodeSpec,
    pub modrm: Option<ModRmSpec>,
    pub imm: ImmWidth,
    pub extra: Vec<u8>,
}

impl FormSpec {
    /// Expand the form. Component sets are materialized (each is small); the
    /// cartesian product itself is produced lazily.
    pub fn encodings(&self) -> BuildResult<FormEncodings> {
        let rex: Vec<Option<u8>> = match &self.rex {
            None => vec![None],
            Some(t) => t.expand().map(Some).collect(),
        };

        let opcode: Vec<Vec<Token>> = match &self.opcode {
            OpcodeSpec::Literal(tokens) => vec![tokens.clone()],
            OpcodeSpec::Template { bytes, forbidden } => match bytes.len() {
                1 => bytes[0]
                    .expand()
                    .filter(|b| !forbidden.contains(b))
                    .map(|b| vec![Token::Byte(b)])
                    .collect(),
                _ => {
                    let mut out = Vec::new();
                    for b0 in bytes[0].expand() {
                        for b1 in bytes[1].expand() {
                            out.push(vec![Token::Byte(b0), Token::Byte(b1)]);
                        }
                    }
                    out
                }
            },
        };

        let modrm: Vec<Vec<Token>> = match &self.modrm {
            None => vec![Vec::new()],
            Some(spec) => spec.forms()?,
        };

        let mut tail = vec![Token::Any; self.imm.wildcard_bytes()];
        tail.extend(self.extra.iter().map(|&b| Token::Byte(b)));

        Ok(FormEncodings {
            prefix: self.prefix.clone(),
            rex,
            opcode,
            modrm,
            tail,
            i_rex: 0,
            i_op: 0,
            i_modrm: 0,
            done: false,
        })
    }
}

/// Lazy cartesian-product iterator over one form's encodings.
///
/// Iteration order is prefix, REX, opcode, ModRM, immediate (outermost to
/// innermost), matching the component declaration order, which keeps the
/// emitted stream deterministic.
#[derive(Debug)]
pub struct FormEncodings {
    prefix: Vec<u8>,
    rex: Vec<Option<u8>>,
    opcode: Vec<Vec<Token>>,
    modrm: Vec<Vec<Token>>,
    tail: Vec<Token>,
    i_rex: usize,
    i_op: usize,
    i_modrm: usize,
    done: bool,
}

impl Iterator for FormEncodings {
    type Item = Pattern;

    fn next(&mut self) -> Option<Pattern> {
        if self.done || self.rex.is_empty() || self.opcode.is_empty() || self.modrm.is_empty() {
            return None;
        }

        let opcode = &self.opcode[self.i_op];
        let modrm = &self.modrm[self.i_modrm];
        let mut tokens = Vec::with_capacity(
            self.prefix.len() + 1 + opcode.len() + modrm.len() + self.tail.len(),
        );
        tokens.extend(self.prefix.iter().map(|&b| Token::Byte(b)));
        if let Some(rex) = self.rex[self.i_rex] {
            tokens.push(Token::Byte(rex));
        }
        tokens.extend_from_slice(opcode);
        tokens.extend_from_slice(modrm);
        tokens.extend_from_slice(&self.tail);

        // Advance the odometer, innermost component first.
        self.i_modrm += 1;
        if self.i_modrm == self.modrm.len() {
            self.i_modrm = 0;
            self.i_op += 1;
            if self.i_op == self.opcode.len() {
                self.i_op = 0;
                self.i_rex += 1;
                if self.i_rex == self.rex.len() {
                    self.done = true;
                }
            }
        }

        Some(Pattern(tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressing::ANY_REG;

    fn spec(opcode: OpcodeSpec) -> FormSpec {
        FormSpec {
            prefix: Vec::new(),
            rex: None,
            opcode,
            modrm: None,
            imm: ImmWidth::None,
            extra: Vec::new(),
        }
    }

    #[test]
    fn record_roundtrip() {
        for class in AcceptClass::ALL {
            let rec = Record {
                pattern: Pattern(vec![Token::Byte(0x01), Token::Byte(0xc0), Token::Any]),
                class,
            };
            let line = rec.to_string();
            assert_eq!(Record::parse(&line, 1).unwrap(), rec);
        }
    }

    #[test]
    fn record_display_matches_interchange_syntax() {
        let rec = Record {
            pattern: Pattern(vec![Token::Byte(0xeb), Token::Any]),
            class: AcceptClass::JmpRel1,
        };
        assert_eq!(rec.to_string(), "eb XX:jmp_rel1");

        let rec = Record {
            pattern: Pattern(vec![Token::Byte(0x01), Token::Byte(0xc0)]),
            class: AcceptClass::Ordinary,
        };
        assert_eq!(rec.to_string(), "01 c0:");
    }

    #[test]
    fn record_parse_rejects_garbage() {
        assert!(Record::parse("01 c0", 3).is_err());
        assert!(Record::parse("01 zz:", 3).is_err());
        assert!(Record::parse("01 c0:wat", 3).is_err());
        assert!(Record::parse(":", 3).is_err());
    }

    #[test]
    fn register_direct_form_fanout() {
        let mut f = spec(OpcodeSpec::Literal(vec![Token::Byte(0x01)]));
        f.modrm = Some(ModRmSpec::parse("11 reg1 reg2", ANY_REG, ANY_REG).unwrap());
        let all: Vec<Pattern> = f.encodings().unwrap().collect();
        assert_eq!(all.len(), 64);
        assert_eq!(all[0].0, vec![Token::Byte(0x01), Token::Byte(0xc0)]);
    }

    #[test]
    fn rex_multiplies_fanout() {
        let mut f = spec(OpcodeSpec::Literal(vec![Token::Byte(0x01)]));
        f.rex = Some(BitTemplate::parse("0100 WR0B").unwrap());
        f.modrm = Some(ModRmSpec::parse("11 reg1 reg2", ANY_REG, ANY_REG).unwrap());
        assert_eq!(f.encodings().unwrap().count(), 8 * 64);
    }

    #[test]
    fn accumulator_immediate_shortcut() {
        let mut f = spec(OpcodeSpec::Literal(vec![Token::Byte(0x04)]));
        f.imm = ImmWidth::W8;
        let all: Vec<Pattern> = f.encodings().unwrap().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].to_string(), "04 XX");
    }

    #[test]
    fn forbidden_opcode_expansion_is_dropped() {
        let f = spec(OpcodeSpec::Template {
            bytes: BitTemplate::parse_seq("0101 1reg").unwrap(),
            forbidden: vec![0x5c],
        });
        let all: Vec<Pattern> = f.encodings().unwrap().collect();
        assert_eq!(all.len(), 7);
        assert!(all
            .iter()
            .all(|p| p.0 != vec![Token::Byte(0x5c)]));
    }

    #[test]
    fn trailing_literals_follow_immediate() {
        let mut f = spec(OpcodeSpec::Literal(vec![Token::Byte(0xc8)]));
        f.imm = ImmWidth::W16;
        f.extra = vec![0x00, 0x89, 0xe4];
        let all: Vec<Pattern> = f.encodings().unwrap().collect();
        assert_eq!(all[0].to_string(), "c8 XX XX 00 89 e4");
    }

    #[test]
    fn two_byte_opcode_template() {
        let f = spec(OpcodeSpec::Template {
            bytes: BitTemplate::parse_seq("0000 1111 1000 tnnn").unwrap(),
            forbidden: Vec::new(),
        });
        let all: Vec<Pattern> = f.encodings().unwrap().collect();
        assert_eq!(all.len(), 16);
        assert_eq!(all[0].0, vec![Token::Byte(0x0f), Token::Byte(0x80)]);
        assert_eq!(all[15].0, vec![Token::Byte(0x0f), Token::Byte(0x8f)]);
    }
}

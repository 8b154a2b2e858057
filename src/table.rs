// This module flattens the reduced automaton into the dense transition table the
// runtime verifier indexes byte by byte. State 0 is the synthetic reject sink whose
// row maps every byte back to 0; every other state id is assigned by one global,
// total sort: accepting nodes first, grouped by class with Ordinary leading (so the
// runtime can test "is this an ordinary accept" with a single range check), then
// non-accepting interior nodes in reduction order. The compiler extracts the verifier
// descriptor: the start state, one representative state per distinguished
// control-transfer class, and the list of ordinary accept states. A catalog whose
// automaton lacks any of the seven mandatory control-transfer classes fails the
// build: such a table could never recognize a required CFI idiom.

//! Dense table compilation and the verifier descriptor.

use crate::encoding::AcceptClass;
use crate::error::{BuildError, BuildResult};
use crate::trie::{Edges, Trie};

/// The descriptor record consumed by the runtime verifier alongside the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Total state count, including the reject sink.
    pub states: usize,
    /// State id of the automaton root.
    pub start: u16,
    pub dcall: u16,
    pub icall: u16,
    pub jmp_rel1: u16,
    pub jmp_rel4: u16,
    /// Representative of the guarded indirect-jump idiom; 0 when the catalog
    /// carries none.
    pub ijmp: u16,
    pub mcficall: u16,
    pub mcficheck: u16,
    pub mcfiret: u16,
    /// Every `Ordinary` accept state, ascending (one contiguous range).
    pub accept: Vec<u16>,
}

/// The compiled transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTable {
    transitions: Vec<[u16; 256]>,
    classes: Vec<Option<AcceptClass>>,
    pub descriptor: TableDescriptor,
}

impl CompiledTable {
    pub fn states(&self) -> usize {
        self.transitions.len()
    }

    /// One deterministic step; state 0 absorbs everything.
    pub fn step(&self, state: u16, byte: u8) -> u16 {
        self.transitions[state as usize][byte as usize]
    }

    /// Walk a byte sequence from the start state.
    pub fn run(&self, bytes: &[u8]) -> u16 {
        bytes
            .iter()
            .fold(self.descriptor.start, |s, &b| self.step(s, b))
    }

    /// Accept class of a state, if it accepts.
    pub fn class_of(&self, state: u16) -> Option<AcceptClass> {
        self.classes[state as usize]
    }

    pub fn row(&self, state: u16) -> &[u16; 256] {
        &self.transitions[state as usize]
    }
}

/// Compile a reduced trie into the dense table and descriptor.
pub fn compile(trie: &Trie) -> BuildResult<CompiledTable> {
    let n = trie.len();
    let states = n + 1; // the reject sink is synthetic
    if states > usize::from(u16::MAX) + 1 {
        return Err(BuildError::TableTooLarge { states });
    }

    // Global deterministic ordering: accepting nodes grouped by class rank,
    // Ordinary first, then interior nodes; ties broken by arena order.
    let mut order: Vec<u32> = (0..n as u32).collect();
    order.sort_by_key(|&id| match trie.node(id).accept {
        Some(class) => (0usize, class.rank(), id),
        None => (1, 0, id),
    });

    let mut new_id = vec![0u16; n];
    for (i, &id) in order.iter().enumerate() {
        new_id[id as usize] = (i + 1) as u16;
    }

    let mut transitions = vec![[0u16; 256]; states];
    let mut classes = vec![None; states];
    for &id in &order {
        let state = new_id[id as usize] as usize;
        classes[state] = trie.node(id).accept;
        let row = &mut transitions[state];
        match &trie.node(id).edges {
            Edges::Empty => {}
            Edges::Wild(child) => {
                *row = [new_id[*child as usize]; 256];
            }
            Edges::Bytes(edges) => {
                for &(byte, child) in edges {
                    row[byte as usize] = new_id[child as usize];
                }
            }
        }
    }

    let mut reps: [Option<u16>; AcceptClass::ALL.len()] = [None; AcceptClass::ALL.len()];
    let mut accept = Vec::new();
    for (state, class) in classes.iter().enumerate().skip(1) {
        if let Some(class) = class {
            if reps[class.rank()].is_none() {
                reps[class.rank()] = Some(state as u16);
            }
            if *class == AcceptClass::Ordinary {
                accept.push(state as u16);
            }
        }
    }
    for class in AcceptClass::REQUIRED {
        if reps[class.rank()].is_none() {
            return Err(BuildError::MissingClass(class));
        }
    }

    for class in AcceptClass::ALL {
        let count = classes.iter().filter(|c| **c == Some(class)).count();
        log::debug!("class {:?} has {} acceptors", class, count);
    }

    let rep = |class: AcceptClass| reps[class.rank()].unwrap_or(0);
    let descriptor = TableDescriptor {
        states,
        start: new_id[trie.root() as usize],
        dcall: rep(AcceptClass::DCall),
        icall: rep(AcceptClass::ICall),
        jmp_rel1: rep(AcceptClass::JmpRel1),
        jmp_rel4: rep(AcceptClass::JmpRel4),
        ijmp: rep(AcceptClass::IJmp),
        mcficall: rep(AcceptClass::McfiCall),
        mcficheck: rep(AcceptClass::McfiCheck),
        mcfiret: rep(AcceptClass::McfiRet),
        accept,
    };

    log::info!(
        "compiled {} states, start {}, {} ordinary accepts",
        states,
        descriptor.start,
        descriptor.accept.len()
    );

    Ok(CompiledTable {
        transitions,
        classes,
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Record;

    fn table_from(lines: &[&str]) -> BuildResult<CompiledTable> {
        let mut trie = Trie::new();
        for (i, line) in lines.iter().enumerate() {
            trie.insert(&Record::parse(line, i + 1)?)?;
        }
        compile(&trie.reduce())
    }

    const BASE: &[&str] = &[
        "01 c0:",
        "01 c1:",
        "f4:terminator",
        "eb XX:jmp_rel1",
        "e9 XX XX XX XX:jmp_rel4",
        "e8 XX XX XX XX:dcall",
        "ff d0:icall",
        "a0:mcficall",
        "a1:mcficheck",
        "a2:mcfiret",
    ];

    #[test]
    fn reject_row_is_all_zeros() {
        let t = table_from(BASE).unwrap();
        assert!(t.row(0).iter().all(|&d| d == 0));
    }

    #[test]
    fn ordinary_accepts_are_contiguous_from_one() {
        let t = table_from(BASE).unwrap();
        let accept = &t.descriptor.accept;
        assert!(!accept.is_empty());
        for (i, &s) in accept.iter().enumerate() {
            assert_eq!(s as usize, i + 1);
            assert_eq!(t.class_of(s), Some(AcceptClass::Ordinary));
        }
    }

    #[test]
    fn walks_reach_declared_classes() {
        let t = table_from(BASE).unwrap();
        assert_eq!(t.class_of(t.run(&[0x01, 0xc0])), Some(AcceptClass::Ordinary));
        assert_eq!(t.class_of(t.run(&[0xf4])), Some(AcceptClass::Terminator));
        assert_eq!(t.class_of(t.run(&[0xeb, 0x7f])), Some(AcceptClass::JmpRel1));
        assert_eq!(
            t.class_of(t.run(&[0xe9, 1, 2, 3, 4])),
            Some(AcceptClass::JmpRel4)
        );
        assert_eq!(t.run(&[0x99]), 0, "undeclared byte must hit the sink");
    }

    #[test]
    fn representatives_match_their_class() {
        let t = table_from(BASE).unwrap();
        let d = &t.descriptor;
        assert_eq!(t.class_of(d.dcall), Some(AcceptClass::DCall));
        assert_eq!(t.class_of(d.icall), Some(AcceptClass::ICall));
        assert_eq!(t.class_of(d.jmp_rel1), Some(AcceptClass::JmpRel1));
        assert_eq!(t.class_of(d.jmp_rel4), Some(AcceptClass::JmpRel4));
        assert_eq!(t.class_of(d.mcficall), Some(AcceptClass::McfiCall));
        assert_eq!(t.class_of(d.mcficheck), Some(AcceptClass::McfiCheck));
        assert_eq!(t.class_of(d.mcfiret), Some(AcceptClass::McfiRet));
        assert_eq!(d.ijmp, 0, "no ijmp idiom in this grammar");
    }

    #[test]
    fn missing_mandatory_class_fails() {
        let lines: Vec<&str> = BASE
            .iter()
            .copied()
            .filter(|l| !l.ends_with(":mcfiret"))
            .collect();
        assert!(matches!(
            table_from(&lines),
            Err(BuildError::MissingClass(AcceptClass::McfiRet))
        ));
    }

    #[test]
    fn compilation_is_deterministic() {
        assert_eq!(table_from(BASE).unwrap(), table_from(BASE).unwrap());
    }

    #[test]
    fn start_state_is_not_accepting() {
        let t = table_from(BASE).unwrap();
        assert_eq!(t.class_of(t.descriptor.start), None);
    }
}

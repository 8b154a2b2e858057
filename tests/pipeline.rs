//! End-to-end pipeline tests: enumerate a representative catalog slice, build
//! and reduce the automaton, compile the table, and check the properties the
//! runtime verifier depends on. The full-catalog sweep is `#[ignore]`d; it
//! builds a multi-million-node trie and is meant for release-mode runs.

use mcfi_tablegen::catalog::{self, Catalog, InstForm, D, F};
use mcfi_tablegen::{compile_catalog, table, AcceptClass, CompiledTable, Pattern, Record, Token, Trie};

use iced_x86::{Decoder, DecoderOptions, Mnemonic};

/// Control transfers, the literal-form families, and a small slice of the
/// data-movement space (register-direct, REX and SIB-heavy memory forms).
fn reduced_catalog() -> Catalog {
    let mut forms = Vec::new();
    catalog::control::register(&mut forms);
    catalog::misc::register(&mut forms);
    catalog::x87::register(&mut forms);
    forms.push(InstForm::spec(
        "add",
        AcceptClass::Ordinary,
        F { opcode: vec![0x01], modrm: "11 reg1 reg2", ..D },
    ));
    forms.push(InstForm::spec(
        "add",
        AcceptClass::Ordinary,
        F { rex: "0100 1R01", opcode: vec![0x01], modrm: "11 reg1 reg2", ..D },
    ));
    forms.push(InstForm::spec(
        "add",
        AcceptClass::Ordinary,
        F { prefix: &[0x67], opcode: vec![0x01], modrm: "mod reg r/m", ..D },
    ));
    forms.push(InstForm::spec(
        "mov",
        AcceptClass::Ordinary,
        F { opcode: vec![0x89], modrm: "11 reg1 reg2", ..D },
    ));
    forms.push(InstForm::spec(
        "mov",
        AcceptClass::Ordinary,
        F { opcode: vec![0x8b], modrm: "mod reg r/m", ..D },
    ));
    Catalog::from_forms(forms)
}

fn compiled() -> CompiledTable {
    compile_catalog(&reduced_catalog()).unwrap()
}

fn instantiate(pattern: &Pattern, fill: u8) -> Vec<u8> {
    pattern
        .0
        .iter()
        .map(|t| match t {
            Token::Byte(b) => *b,
            Token::Any => fill,
        })
        .collect()
}

#[test]
fn every_record_replays_to_its_class() {
    let catalog = reduced_catalog();
    let table = compiled();
    for record in catalog.records() {
        let record = record.unwrap();
        for fill in [0x00, 0xa7, 0xff] {
            let bytes = instantiate(&record.pattern, fill);
            let state = table.run(&bytes);
            assert_eq!(
                table.class_of(state),
                Some(record.class),
                "record {record} (fill {fill:#04x}) landed on state {state}"
            );
        }
    }
}

#[test]
fn reject_state_is_a_self_loop() {
    let table = compiled();
    assert!(table.row(0).iter().all(|&d| d == 0));
}

#[test]
fn compilation_is_reproducible() {
    assert_eq!(compiled(), compiled());
}

#[test]
fn interchange_text_roundtrip_preserves_the_table() {
    let catalog = reduced_catalog();

    let direct = Trie::from_records(catalog.records()).unwrap();

    let mut via_text = Trie::new();
    for record in catalog.records() {
        let line = record.unwrap().to_string();
        via_text.insert(&Record::parse(&line, 1).unwrap()).unwrap();
    }

    assert_eq!(
        table::compile(&direct.reduce()).unwrap(),
        table::compile(&via_text.reduce()).unwrap()
    );
}

#[test]
fn mandatory_classes_are_recognized() {
    let table = compiled();
    let d = &table.descriptor;
    for (rep, class) in [
        (d.dcall, AcceptClass::DCall),
        (d.icall, AcceptClass::ICall),
        (d.jmp_rel1, AcceptClass::JmpRel1),
        (d.jmp_rel4, AcceptClass::JmpRel4),
        (d.ijmp, AcceptClass::IJmp),
        (d.mcficall, AcceptClass::McfiCall),
        (d.mcficheck, AcceptClass::McfiCheck),
        (d.mcfiret, AcceptClass::McfiRet),
    ] {
        assert_ne!(rep, 0);
        assert_eq!(table.class_of(rep), Some(class));
    }
    assert!(!d.accept.is_empty());
    for &s in &d.accept {
        assert_eq!(table.class_of(s), Some(AcceptClass::Ordinary));
    }
}

#[test]
fn concrete_walks() {
    let table = compiled();
    // add eax, eax
    assert_eq!(table.class_of(table.run(&[0x01, 0xc0])), Some(AcceptClass::Ordinary));
    // jmp rel32 with an arbitrary displacement
    assert_eq!(
        table.class_of(table.run(&[0xe9, 0xde, 0xad, 0xbe, 0xef])),
        Some(AcceptClass::JmpRel4)
    );
    // hlt carries its own class
    assert_eq!(table.class_of(table.run(&[0xf4])), Some(AcceptClass::Terminator));
    // an unsanctioned byte falls into the sink
    assert_eq!(table.run(&[0x06]), 0);
}

#[test]
fn accepted_sequences_do_not_continue() {
    // After a complete instruction the verifier resets to the start state;
    // the accept state itself must not extend into the following bytes.
    let table = compiled();
    let accept = table.run(&[0x01, 0xc0]);
    assert_eq!(table.class_of(accept), Some(AcceptClass::Ordinary));
    assert_eq!(table.step(accept, 0xf4), 0);
    // the next instruction resolves independently from the start state
    assert_eq!(table.class_of(table.run(&[0xf4])), Some(AcceptClass::Terminator));
}

#[test]
fn idiom_prefix_is_independently_accepted() {
    let table = compiled();
    // `mov %eax, %eax` is a complete instruction...
    let accept = table.run(&[0x89, 0xc0]);
    assert_eq!(table.class_of(accept), Some(AcceptClass::Ordinary));
    // ...and also the first step of the rax MCFI call idiom, which keeps
    // walking from the same node to its own accept.
    let idiom = [
        0x89, 0xc0, // movl %eax, %eax
        0x65, 0x4c, 0x8b, 0x14, 0x25, 0x00, 0x00, 0x00, 0x00, // movq %gs:slot, %r10
        0x65, 0x4c, 0x39, 0x10, // cmpq %r10, %gs:(%rax)
        0x75, 0x33, // jne check
        0xff, 0xd0, // call *%rax
    ];
    assert_eq!(table.class_of(table.run(&idiom)), Some(AcceptClass::McfiCall));
}

#[test]
fn no_rip_relative_escape() {
    // mod=00 r/m=101 never appears after the plain mov opcode
    let table = compiled();
    let after_mov = table.run(&[0x8b]);
    assert_ne!(after_mov, 0);
    assert_eq!(table.step(after_mov, 0x05), 0, "RIP-relative form reachable");
    // while the plain register-indirect form is walkable
    assert_ne!(table.step(after_mov, 0x00), 0);
}

#[test]
fn sampled_encodings_decode_as_claimed() {
    let cases: &[(&[u8], Mnemonic)] = &[
        (&[0x01, 0xc0], Mnemonic::Add),
        (&[0x49, 0x01, 0xc3], Mnemonic::Add),
        (&[0x67, 0x01, 0x04, 0x24], Mnemonic::Add),
        (&[0x89, 0xc0], Mnemonic::Mov),
        (&[0x8b, 0x40, 0x7f], Mnemonic::Mov),
        (&[0xe9, 0x00, 0x00, 0x00, 0x00], Mnemonic::Jmp),
        (&[0xeb, 0x10], Mnemonic::Jmp),
        (&[0xe8, 0x00, 0x00, 0x00, 0x00], Mnemonic::Call),
        (&[0x74, 0x05], Mnemonic::Je),
        (&[0xf4], Mnemonic::Hlt),
        (&[0xcc], Mnemonic::Int3),
        (&[0x90], Mnemonic::Nop),
    ];
    for (bytes, mnemonic) in cases {
        let mut decoder = Decoder::with_ip(64, bytes, 0, DecoderOptions::NONE);
        let instr = decoder.decode();
        assert_eq!(instr.mnemonic(), *mnemonic, "bytes {bytes:02x?}");
        assert_eq!(instr.len(), bytes.len(), "bytes {bytes:02x?}");
    }
}

#[test]
#[ignore = "full catalog sweep; run in release mode"]
fn full_catalog_compiles() {
    let catalog = Catalog::build();
    let table = compile_catalog(&catalog).unwrap();

    assert!(table.states() > 1000);
    assert_eq!(table.class_of(table.run(&[0x01, 0xc0])), Some(AcceptClass::Ordinary));
    assert_eq!(
        table.class_of(table.run(&[0xe9, 0x01, 0x02, 0x03, 0x04])),
        Some(AcceptClass::JmpRel4)
    );
    assert_eq!(table.class_of(table.run(&[0xf4])), Some(AcceptClass::Terminator));
    for (rep, class) in [
        (table.descriptor.dcall, AcceptClass::DCall),
        (table.descriptor.icall, AcceptClass::ICall),
        (table.descriptor.mcficall, AcceptClass::McfiCall),
        (table.descriptor.mcficheck, AcceptClass::McfiCheck),
        (table.descriptor.mcfiret, AcceptClass::McfiRet),
    ] {
        assert_eq!(table.class_of(rep), Some(class));
    }
}

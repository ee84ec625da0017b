use toumapet_core::cpu::{StatusFlag, Step, W65C02};
mod common;
use common::TestBus;

#[test]
fn test_lda_immediate() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$42
    bus.load(0, &[0xA9, 0x42]);

    assert_eq!(cpu.step(&mut bus).unwrap(), Step::Normal);

    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 2);
    let p = cpu.snapshot().p;
    assert_eq!(p & (StatusFlag::Z as u8), 0);
    assert_eq!(p & (StatusFlag::N as u8), 0);
}

#[test]
fn test_lda_zero_sets_z() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x00]);

    cpu.step(&mut bus).unwrap();

    let p = cpu.snapshot().p;
    assert_ne!(p & (StatusFlag::Z as u8), 0);
    assert_eq!(p & (StatusFlag::N as u8), 0);
}

#[test]
fn test_lda_negative_sets_n() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xA9, 0x80]);

    cpu.step(&mut bus).unwrap();

    let p = cpu.snapshot().p;
    assert_eq!(p & (StatusFlag::Z as u8), 0);
    assert_ne!(p & (StatusFlag::N as u8), 0);
}

#[test]
fn test_nop_advances_pc() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xEA]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_wai_reports_idle() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // WAI
    bus.load(0, &[0xCB]);

    assert_eq!(cpu.step(&mut bus).unwrap(), Step::Wai);
    // PC moves past the opcode so the CPU resumes on the next step.
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_undefined_opcode_is_an_error() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.load(0x0200, &[0x02]);
    cpu.pc = 0x0200;

    let err = cpu.step(&mut bus).unwrap_err();
    assert_eq!(err.pc, 0x0200);
    assert_eq!(err.opcode, 0x02);
}

#[test]
fn test_brk_and_stp_decode_as_undefined() {
    for opcode in [0x00u8, 0xDB] {
        let mut cpu = W65C02::new();
        let mut bus = TestBus::new();
        bus.load(0, &[opcode]);
        assert_eq!(cpu.step(&mut bus).unwrap_err().opcode, opcode);
    }
}

#[test]
fn test_transfers() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$7F; TAX; TAY; LDA #$00; TXA
    bus.load(0, &[0xA9, 0x7F, 0xAA, 0xA8, 0xA9, 0x00, 0x8A]);

    for _ in 0..5 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.x, 0x7F);
    assert_eq!(cpu.y, 0x7F);
    assert_eq!(cpu.a, 0x7F);
}

#[test]
fn test_txs_does_not_touch_flags() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDX #$00 (Z set); TXS
    bus.load(0, &[0xA2, 0x00, 0x9A]);

    cpu.step(&mut bus).unwrap();
    let before = cpu.snapshot().p;
    cpu.step(&mut bus).unwrap();

    assert_eq!(cpu.sp, 0x00);
    assert_eq!(cpu.snapshot().p, before);
}

#[test]
fn test_register_inc_dec() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDX #$FF; INX; LDY #$01; DEY
    bus.load(0, &[0xA2, 0xFF, 0xE8, 0xA0, 0x01, 0x88]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.x, 0x00);
    assert_ne!(cpu.snapshot().p & (StatusFlag::Z as u8), 0);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.y, 0x00);
    assert_ne!(cpu.snapshot().p & (StatusFlag::Z as u8), 0);
}

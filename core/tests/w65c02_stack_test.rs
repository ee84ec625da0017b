use toumapet_core::cpu::{StatusFlag, W65C02};
mod common;
use common::TestBus;

#[test]
fn test_pha_pla() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$42; PHA; LDA #$00; PLA
    bus.load(0, &[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.sp, 0xFE);
    assert_eq!(bus.memory[0x01FF], 0x42);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_phx_plx_phy_ply() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.x = 0x11;
    cpu.y = 0x22;
    // PHX; PHY; LDX #0; LDY #0; PLY; PLX
    bus.load(0, &[0xDA, 0x5A, 0xA2, 0x00, 0xA0, 0x00, 0x7A, 0xFA]);

    for _ in 0..6 {
        cpu.step(&mut bus).unwrap();
    }
    assert_eq!(cpu.y, 0x22);
    assert_eq!(cpu.x, 0x11);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_pla_sets_nz() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$80; PHA; LDA #$01; PLA -> N set
    bus.load(0, &[0xA9, 0x80, 0x48, 0xA9, 0x01, 0x68]);

    for _ in 0..4 {
        cpu.step(&mut bus).unwrap();
    }
    assert_ne!(cpu.snapshot().p & (StatusFlag::N as u8), 0);
}

#[test]
fn test_php_pushes_b_and_u() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$80 (N set); SEC; PHP
    bus.load(0, &[0xA9, 0x80, 0x38, 0x08]);

    for _ in 0..3 {
        cpu.step(&mut bus).unwrap();
    }
    // N | B | U | I (still set from reset) | C
    let expected = StatusFlag::N as u8
        | StatusFlag::B as u8
        | StatusFlag::U as u8
        | StatusFlag::I as u8
        | StatusFlag::C as u8;
    assert_eq!(bus.memory[0x01FF], expected);
}

#[test]
fn test_plp_restores_flags() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$80; SEC; PHP; CLC; LDA #$00; PLP
    bus.load(0, &[0xA9, 0x80, 0x38, 0x08, 0x18, 0xA9, 0x00, 0x28]);

    for _ in 0..6 {
        cpu.step(&mut bus).unwrap();
    }
    let p = cpu.snapshot().p;
    assert_ne!(p & (StatusFlag::N as u8), 0);
    assert_ne!(p & (StatusFlag::C as u8), 0);
    assert_eq!(p & (StatusFlag::Z as u8), 0);
}

#[test]
fn test_stack_wraps() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x00;
    cpu.a = 0x33;
    // PHA twice wraps the pointer through 0xFF
    bus.load(0, &[0x48, 0x48]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x0100], 0x33);
    assert_eq!(cpu.sp, 0xFF);
    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x01FF], 0x33);
    assert_eq!(cpu.sp, 0xFE);
}

use toumapet_core::cpu::{StatusFlag, W65C02};
mod common;
use common::TestBus;

fn flag(cpu: &W65C02, f: StatusFlag) -> bool {
    cpu.snapshot().p & (f as u8) != 0
}

#[test]
fn test_asl_accumulator() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x81;
    bus.load(0, &[0x0A]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x02);
    assert!(flag(&cpu, StatusFlag::C));
}

#[test]
fn test_asl_memory() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x10] = 0x40;
    // ASL $10
    bus.load(0, &[0x06, 0x10]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x10], 0x80);
    assert!(!flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::N));
}

#[test]
fn test_lsr_sets_carry_from_bit0() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    bus.load(0, &[0x4A]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::Z));
}

#[test]
fn test_rol_through_carry() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    // SEC; ROL A -> carry in to bit 0, bit 7 out to carry
    bus.load(0, &[0x38, 0x2A]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x01);
    assert!(flag(&cpu, StatusFlag::C));
}

#[test]
fn test_ror_through_carry() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    // SEC; ROR A
    bus.load(0, &[0x38, 0x6A]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x80);
    assert!(flag(&cpu, StatusFlag::C));
    assert!(flag(&cpu, StatusFlag::N));
}

#[test]
fn test_inc_dec_accumulator() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.a = 0xFF;
    // INC A; DEC A; DEC A
    bus.load(0, &[0x1A, 0x3A, 0x3A]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0x00);
    assert!(flag(&cpu, StatusFlag::Z));

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0xFF);
    assert!(flag(&cpu, StatusFlag::N));

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.a, 0xFE);
}

#[test]
fn test_inc_dec_memory() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x10] = 0x7F;
    bus.memory[0x2000] = 0x01;
    // INC $10; DEC $2000
    bus.load(0, &[0xE6, 0x10, 0xCE, 0x00, 0x20]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x10], 0x80);
    assert!(flag(&cpu, StatusFlag::N));

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x2000], 0x00);
    assert!(flag(&cpu, StatusFlag::Z));
}

#[test]
fn test_shift_abs_x() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.x = 0x05;
    bus.memory[0x2005] = 0x03;
    // LSR $2000,X
    bus.load(0, &[0x5E, 0x00, 0x20]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(bus.memory[0x2005], 0x01);
    assert!(flag(&cpu, StatusFlag::C));
}

use toumapet_core::cpu::W65C02;
mod common;
use common::TestBus;

#[test]
fn test_beq_taken() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$00; BEQ +2
    bus.load(0, &[0xA9, 0x00, 0xF0, 0x02]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0006);
}

#[test]
fn test_bne_not_taken() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$00; BNE +2
    bus.load(0, &[0xA9, 0x00, 0xD0, 0x02]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0004);
}

#[test]
fn test_bra_always_taken() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0200;
    // BRA -2 (branch onto itself)
    bus.load(0x0200, &[0x80, 0xFE]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0200);
}

#[test]
fn test_bmi_bpl() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // LDA #$80; BMI +1; (skipped NOP); BPL +9
    bus.load(0, &[0xA9, 0x80, 0x30, 0x01, 0xEA, 0x10, 0x09]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0005);
    cpu.step(&mut bus).unwrap(); // BPL not taken (N set)
    assert_eq!(cpu.pc, 0x0007);
}

#[test]
fn test_bcs_bcc() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // SEC; BCS +2; then from 5: CLC; BCC -8
    bus.load(0, &[0x38, 0xB0, 0x02, 0xEA, 0xEA, 0x18, 0x90, 0xF8]);

    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0005);
    cpu.step(&mut bus).unwrap();
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0000);
}

#[test]
fn test_bbr_bbs() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x40] = 0b0000_0001;
    // BBR0 $40,+4 (bit set: fall through); BBS0 $40,+4 (taken)
    bus.load(0, &[0x0F, 0x40, 0x04, 0x8F, 0x40, 0x04]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0003);
    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x000A);
}

#[test]
fn test_bbr_high_bit() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x40] = 0b0111_1111;
    // BBR7 $40,+4 (bit clear: taken)
    bus.load(0, &[0x7F, 0x40, 0x04]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0007);
}

#[test]
fn test_jmp_absolute() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x4C, 0x00, 0x80]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x8000);
}

#[test]
fn test_jmp_indirect_crosses_pages() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // Pointer straddling a page boundary: the 65C02 carries correctly.
    bus.memory[0x02FF] = 0x34;
    bus.memory[0x0300] = 0x12;
    bus.load(0, &[0x6C, 0xFF, 0x02]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_jmp_indirect_indexed() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    cpu.x = 0x04;
    bus.memory[0x2004] = 0x00;
    bus.memory[0x2005] = 0x90;
    // JMP ($2000,X)
    bus.load(0, &[0x7C, 0x00, 0x20]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn test_jsr_rts() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // JSR $8000 ... at $8000: RTS
    bus.load(0, &[0x20, 0x00, 0x80]);
    bus.load(0x8000, &[0x60]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(cpu.sp, 0xFD);
    // Return address is the last byte of the JSR instruction.
    assert_eq!(bus.memory[0x01FF], 0x00);
    assert_eq!(bus.memory[0x01FE], 0x02);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x0003);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_rti_restores_flags_and_pc() {
    let mut cpu = W65C02::new();
    let mut bus = TestBus::new();
    // Hand-build an interrupt frame: P with C|Z set, return 0x1234.
    bus.memory[0x01FD] = 0x23; // P: C|Z|U
    bus.memory[0x01FE] = 0x34;
    bus.memory[0x01FF] = 0x12;
    cpu.sp = 0xFC;
    bus.load(0, &[0x40]);

    cpu.step(&mut bus).unwrap();
    assert_eq!(cpu.pc, 0x1234);
    assert_eq!(cpu.sp, 0xFF);
    let p = cpu.snapshot().p;
    assert_ne!(p & 0x01, 0);
    assert_ne!(p & 0x02, 0);
}

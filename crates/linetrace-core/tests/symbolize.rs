//! Symbol lookup and frame annotation

mod common;

use common::{line_unit, ElfBuilder, Program};
use linetrace_core::types::SymbolLanguage;
use linetrace_core::{locate, Address, Symbolizer};
use object::elf::{STT_FUNC, STT_NOTYPE, STT_OBJECT};

fn kernel_image() -> Vec<u8>
{
    let program = Program::new()
        .set_address(0xffff_8000_0000_1000)
        .advance_line(41)
        .copy()
        .advance_pc(0x20)
        .advance_line(3)
        .copy()
        .advance_pc(0x40)
        .end_sequence();
    let debug_line = line_unit(3, &["kernel"], &[("panic.rs", 1)], &program);

    ElfBuilder::new()
        .debug_section(".debug_line", &debug_line)
        .symbol("_ZN6kernel5panic8do_panic17h0011223344556677E", 0xffff_8000_0000_1000, 0x60, STT_FUNC)
        .symbol("panic_stub", 0xffff_8000_0000_1040, 0x10, STT_NOTYPE)
        .symbol("PANIC_COUNT", 0xffff_8000_0000_1000, 0x100, STT_OBJECT)
        .symbol("label", 0xffff_8000_0000_1000, 0, STT_NOTYPE)
        .build()
}

#[test]
fn test_symbol_for_address()
{
    let image = kernel_image();
    let descriptor = locate(&image).unwrap();
    let symbolizer = Symbolizer::new(&descriptor);

    let (symbol, offset) = symbolizer.symbol_for(Address::new(0xffff_8000_0000_1024)).unwrap();
    assert_eq!(symbol.display_name(), "kernel::panic::do_panic");
    assert_eq!(symbol.language(), SymbolLanguage::Rust);
    assert_eq!(offset, 0x24);

    // Nested symbols: the one starting closest below wins
    let (symbol, offset) = symbolizer.symbol_for(Address::new(0xffff_8000_0000_1048)).unwrap();
    assert_eq!(symbol.display_name(), "panic_stub");
    assert_eq!(offset, 8);

    // Data objects and zero-sized labels are not code
    assert!(symbolizer.symbol_for(Address::new(0xffff_8000_0000_10a0)).is_none());
}

#[test]
fn test_symbolicate_trace()
{
    let image = kernel_image();
    let descriptor = locate(&image).unwrap();
    let frames = Symbolizer::new(&descriptor).symbolicate_trace(&[
        Address::new(0xffff_8000_0000_1024),
        Address::new(0xffff_8000_0000_1004),
        Address::new(0x10),
    ]);

    assert_eq!(frames.len(), 3);
    assert_eq!(
        frames[0].to_string(),
        "0xffff800000001024  kernel::panic::do_panic+0x24 at kernel/panic.rs:45"
    );
    assert_eq!(frames[1].location.line, 42);
    assert_eq!(frames[2].to_string(), "0x0000000000000010  ?? at ??:0");
    assert!(frames[2].symbol.is_none());
}

#[test]
fn test_symbols_iterator_includes_null_entry()
{
    let image = kernel_image();
    let descriptor = locate(&image).unwrap();
    let symbols: Vec<_> = descriptor.symbols().collect();

    assert_eq!(symbols.len(), 5);
    assert_eq!(symbols[0].name, b"");
    assert_eq!(symbols[1].index, 1);
    assert_eq!(symbols[2].name, b"panic_stub");
    assert!(symbols[2].is_code());
    assert!(!symbols[3].is_code());
    assert!(!symbols[4].is_code());
}

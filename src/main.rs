use std::env;
use std::process;

use nes_debugger::memory::PRG_ROM_START;
use nes_debugger::{debug_flags, Debugger, Disassembler, Emulator, ReadRange, Rom};

struct Options {
    rom_path: String,
    disasm: bool,
    breakpoints: Vec<u16>,
    break_after: Option<u64>,
    max_ticks: u64,
}

fn usage() -> ! {
    eprintln!("Usage: nes-debugger <rom.nes> [--disasm] [--break <hex-pc>] [--ins <n>] [--max-ticks <n>]");
    process::exit(2);
}

fn parse_options() -> Options {
    let mut args = env::args().skip(1);
    let mut options = Options {
        rom_path: String::new(),
        disasm: false,
        breakpoints: Vec::new(),
        break_after: None,
        max_ticks: 600,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--disasm" => options.disasm = true,
            "--break" => {
                let value = args.next().unwrap_or_else(|| usage());
                let addr = u16::from_str_radix(value.trim_start_matches("0x"), 16)
                    .unwrap_or_else(|_| usage());
                options.breakpoints.push(addr);
            }
            "--ins" => {
                let value = args.next().unwrap_or_else(|| usage());
                options.break_after = Some(value.parse().unwrap_or_else(|_| usage()));
            }
            "--max-ticks" => {
                let value = args.next().unwrap_or_else(|| usage());
                options.max_ticks = value.parse().unwrap_or_else(|_| usage());
            }
            _ if options.rom_path.is_empty() => options.rom_path = arg,
            _ => usage(),
        }
    }

    if options.rom_path.is_empty() {
        usage();
    }
    options
}

fn main() {
    env_logger::init();
    let options = parse_options();

    let rom = match Rom::from_file(&options.rom_path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("Failed to read {}: {}", options.rom_path, e);
            process::exit(1);
        }
    };
    if rom.header().is_none() {
        eprintln!("ROM not loaded: {} is not an iNES file", options.rom_path);
        process::exit(1);
    }

    if options.disasm {
        let mut disassembler = Disassembler::new();
        disassembler.parse(rom.prg_bytes(), PRG_ROM_START);
        let total = disassembler.code().map(|c| c.num_lines()).unwrap_or(0);
        let mut printed = 0;
        while printed < total {
            let lines = match disassembler.read(ReadRange {
                num_of_lines: 64,
                ..Default::default()
            }) {
                Ok(lines) if !lines.is_empty() => lines,
                _ => break,
            };
            for line in &lines {
                println!("${:04X}  {}", line.address, line.asm);
            }
            printed += lines.len();
        }
        return;
    }

    let mut emulator = Emulator::new();
    emulator.cpu.clock.frequency = debug_flags::tick_frequency(emulator.cpu.clock.frequency);
    emulator.load_prg(&rom.prg_image());
    emulator.power_up();

    let debugging =
        !options.breakpoints.is_empty() || options.break_after.is_some();
    if debugging {
        let mut debugger = Debugger::new();
        for &addr in &options.breakpoints {
            debugger.add_breakpoint(addr);
        }
        if let Some(n) = options.break_after {
            debugger.break_after(n);
        }
        debugger.on_pause(|event| {
            if debug_flags::verbose_pause() {
                println!("paused: {}", event.cpu_state);
            } else {
                println!("paused at ${:04X}", event.pc);
            }
        });
        emulator.attach_debugger(debugger);
    }

    for _ in 0..options.max_ticks {
        match emulator.run_tick() {
            Ok(tick) if tick.paused => {
                println!("{}", emulator.cpu.state());
                return;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Execution halted: {}", e);
                println!("{}", emulator.cpu.state());
                process::exit(1);
            }
        }
    }
}

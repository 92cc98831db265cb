//! capnc command line.

use std::io::IsTerminal;

use capn_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};
use capn_diagnostic::Diagnostic;
use capnc::{
    dump, init_tracing, load_precompiled, write_precompiled, CompileError, CompileOptions, Compiler,
    NodeRef,
};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "dump" => {
            let (options, files) = parse_options(&args[2..]);
            let [file] = files.as_slice() else {
                eprintln!("Usage: capnc dump <file.capnp> [options]");
                eprintln!("Run `capnc help` for the list of options.");
                std::process::exit(1);
            };
            let root = compile_or_exit(&options, file);
            print_tree(&root);
        }
        "compile" => {
            // -o needs lookahead; everything else is a compile option.
            let mut output = None;
            let mut rest = Vec::new();
            let mut i = 2;
            while i < args.len() {
                if args[i] == "-o" && i + 1 < args.len() {
                    output = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    rest.push(args[i].clone());
                    i += 1;
                }
            }

            let (options, files) = parse_options(&rest);
            let ([file], Some(output)) = (files.as_slice(), output) else {
                eprintln!("Usage: capnc compile <file.capnp> -o <out> [options]");
                eprintln!("Run `capnc help` for the list of options.");
                std::process::exit(1);
            };
            let root = compile_or_exit(&options, file);
            if let Err(error) = write_precompiled(root.graph(), &output) {
                report(&error);
            }
        }
        "inspect" => {
            if args.len() != 3 {
                eprintln!("Usage: capnc inspect <file.capnp.bin>");
                std::process::exit(1);
            }
            match load_precompiled(&args[2]) {
                Ok(root) => print_tree(&root),
                Err(error) => report(&error),
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("capnc {}", env!("CARGO_PKG_VERSION"));
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn parse_options(args: &[String]) -> (CompileOptions, Vec<String>) {
    match CompileOptions::from_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn compile_or_exit(options: &CompileOptions, file: &str) -> NodeRef {
    match Compiler::new(options.clone()).compile(file) {
        Ok(root) => root,
        Err(error) => report(&error),
    }
}

fn print_tree(root: &NodeRef) {
    match dump(root) {
        Ok(text) => print!("{text}"),
        Err(error) => emit_and_exit(&error.to_diagnostic()),
    }
}

fn report(error: &CompileError) -> ! {
    emit_and_exit(&error.to_diagnostic())
}

fn emit_and_exit(diagnostic: &Diagnostic) -> ! {
    let is_tty = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::<std::io::Stderr>::stderr(ColorMode::Auto, is_tty);
    emitter.emit(diagnostic);
    emitter.emit_summary(1);
    emitter.flush();
    std::process::exit(1);
}

fn print_usage() {
    println!("capnc - Cap'n Proto schema compiler");
    println!();
    println!("Usage: capnc <command> [options]");
    println!();
    println!("Commands:");
    println!("  dump <file.capnp>              Compile and print the schema tree");
    println!("  compile <file.capnp> -o <out>  Write the precompiled schema");
    println!("  inspect <out>                  Print the tree of a precompiled schema");
    println!("  help                           Show this message");
    println!("  version                        Show version");
    println!();
    print_option_help();
}

fn print_option_help() {
    println!("Options:");
    println!("  -I <dir>, --import-path=<dir>  Search <dir> for absolute imports");
    println!("  --src-prefix=<dir>             Strip <dir> from file names");
    println!("  --no-standard-import           Do not search /usr/local/include or /usr/include");
    println!();
    println!("Set RUST_LOG (for example RUST_LOG=capn_schema=debug) to trace compilation.");
}

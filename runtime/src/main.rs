use pzero::runtime::{Runtime, RuntimeConfig};
use pzero::VERSION;
use std::process;

fn main() {
    let mut trace = false;
    let mut list_code = false;
    let mut path = None;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--trace" => trace = true,
            "--list" => list_code = true,
            "--version" => {
                println!("pzero runtime v{}", VERSION);
                return;
            }
            _ => path = Some(arg),
        }
    }

    let Some(path) = path else {
        eprintln!("usage: pzero [--trace] [--list] <instruction-file>");
        process::exit(1);
    };

    let runtime = Runtime::with_config(
        RuntimeConfig::default()
            .with_trace(trace)
            .with_list_code(list_code),
    );

    if let Err(e) = runtime.execute_file(&path) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

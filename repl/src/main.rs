mod error;
mod lexer;
mod parser;
mod repl;
mod session;

use crate::repl::Repl;
use std::env;
use tracing::Level;
use vreg_core::BackendOptions;

fn main() -> anyhow::Result<()> {
    let mut options = BackendOptions::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => options = options.with_trace_emission(true),
            "--no-verify" => options = options.with_verify(false),
            _ => {
                println!("Usage: vreg [--trace] [--no-verify]");
                return Ok(());
            }
        }
    }
    let level = if options.trace_emission {
        Level::TRACE
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::debug!("Backend options: {:?}", options);

    let mut repl = Repl::new(options);
    repl.run()
}

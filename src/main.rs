#![allow(clippy::print_stderr)]

use clap::Parser;
use fastwalk::{Config, RunContext, run};
use std::ffi::OsString;
use std::io::{BufWriter, stdout};
use std::os::unix::ffi::OsStrExt as _;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
/// Print files under the given roots in the order their data sits on
/// disk, or read them ahead into the page cache in that order.
pub struct Args {
    #[arg(
        short = 'p',
        value_name = "SKIP",
        help = "Skip files/directories named SKIP (a simple name, not a path; may repeat)"
    )]
    skip: Vec<OsString>,

    #[arg(
        short = 'r',
        help = "Read ahead files instead of outputting names\n"
    )]
    readahead: bool,

    #[arg(
        value_name = "ROOT",
        help = "Directory trees to walk (defaults to the current directory)"
    )]
    roots: Vec<OsString>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help/--version land here too and must exit 0; actual
            // misuse prints the usage block and exits 1
            let misuse = e.use_stderr();
            let _ = e.print();
            return if misuse { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    let config = Config::new(args.skip.iter().map(|s| s.as_bytes()), args.readahead);
    let roots: Vec<Box<[u8]>> = if args.roots.is_empty() {
        vec![b".".to_vec().into()]
    } else {
        args.roots
            .iter()
            .map(|r| r.as_bytes().to_vec().into())
            .collect()
    };

    let mut ctx = RunContext::new(config);
    let out = stdout();
    let mut writer = BufWriter::new(out.lock());
    if let Err(e) = run(&mut ctx, &roots, &mut writer) {
        eprintln!("stdout: {e}");
        return ExitCode::FAILURE;
    }

    if ctx.reporter.had_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

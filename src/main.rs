//! gitver binary entry point.

fn main() {
    if let Err(e) = gitver::cli::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

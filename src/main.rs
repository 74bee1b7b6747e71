fn main() {
    if let Err(err) = gotcha::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}

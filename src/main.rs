fn main() {
    if let Err(err) = family_forest::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

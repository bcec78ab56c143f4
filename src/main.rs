fn main() {
    if let Err(err) = school_climate::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

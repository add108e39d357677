fn main() {
    if let Err(e) = set_finder_lib::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn main() {
    if let Err(err) = mlstac::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn main() {
    if let Err(err) = flowfork::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn main() {
    if let Err(e) = aboutme_lib::run() {
        eprintln!("aboutme: {e}");
        std::process::exit(1);
    }
}

#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = flexwm::run_from_env() {
        eprintln!("flexwm: {error}");
        std::process::exit(error.exit_code());
    }
}

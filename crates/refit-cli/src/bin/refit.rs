fn main() {
    let code = refit_cli::run_from_env();
    std::process::exit(code);
}

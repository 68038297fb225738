fn main() {
    std::process::exit(jt_jvm::cli::run());
}

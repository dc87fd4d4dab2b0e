fn main() {
    std::process::exit(chartsnap::cli::run());
}

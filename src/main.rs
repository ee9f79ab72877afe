fn main() {
    chipboard::cli::run();
}

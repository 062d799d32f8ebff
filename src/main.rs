fn main() {
    if let Err(err) = fxgraph::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

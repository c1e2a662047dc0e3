/// Display version information
pub fn execute() {
    println!("voting {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for a single-round voting session");
}

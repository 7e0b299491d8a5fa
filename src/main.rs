use silt::silt::Silt;

fn main() {
    Silt::new().main();
}

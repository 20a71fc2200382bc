extern crate build_misoc;

fn main() {
    build_misoc::cfg();
}

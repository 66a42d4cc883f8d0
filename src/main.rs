use castellan::uci;

fn main() {
    uci::run();
}

fn main() {
    archer_arena::game::run();
}

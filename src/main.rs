fn main() {
    spooky_platformer::game::run();
}

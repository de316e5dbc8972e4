fn main() {
    taskfocus_lib::run()
}

fn main() -> std::process::ExitCode {
    lesson_planner_lib::run()
}

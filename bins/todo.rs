#[path = "boot.rs"]
mod boot;

fn main() -> std::process::ExitCode {
    boot::run("todo", server::run_todo)
}

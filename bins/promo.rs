#[path = "boot.rs"]
mod boot;

fn main() -> std::process::ExitCode {
    boot::run("promo", server::run_promo)
}

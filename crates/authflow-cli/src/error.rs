use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("group") && msg.contains("not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List available groups with:");
        eprintln!("  {} authflow group list", "$".dimmed());
    }

    if msg.contains("identity") && msg.contains("not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List available identities with:");
        eprintln!("  {} authflow identity list", "$".dimmed());
    }

    if msg.contains("no chrome binary") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Install Google Chrome, or point at an existing binary in");
        eprintln!("  the [browser] section of ~/.authflow/config.toml.");
    }

    if msg.contains("already active") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Wait for the running flow to finish before retrying.");
    }

    std::process::exit(1);
}

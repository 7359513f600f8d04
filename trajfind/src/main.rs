use trajfind::command_argument_builder;
use trajfind::handlers::{handle_locate, handle_scan, handle_validate, print_banner};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("locate", primary_command)) => handle_locate(primary_command, quiet).await,
        Some(("scan", primary_command)) => handle_scan(primary_command),
        Some(("validate", primary_command)) => handle_validate(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    }
}

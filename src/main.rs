// Prints the brew form options of one owner as JSON.
//
// Usage: brew-log [config.json] [owner-id] [cups]

use std::path::PathBuf;
use std::process::ExitCode;

use brew_log_lib::commands::brew_form_options;
use brew_log_lib::domain::OwnerId;
use brew_log_lib::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let config_path = PathBuf::from(args.next().unwrap_or_else(|| "brew_log.json".to_string()));
    let owner = OwnerId(args.next().and_then(|v| v.parse().ok()).unwrap_or(1));
    let cups = args.next().and_then(|v| v.parse().ok());

    let state = match AppState::open_with_config_file(&config_path).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("brew-log: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = match brew_form_options(&state, owner, cups).await {
        Ok(options) => options,
        Err(e) => {
            log::error!("Failed to build brew form for {}: {}", owner, e);
            eprintln!("brew-log: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&options) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("brew-log: {}", e);
            ExitCode::FAILURE
        }
    }
}

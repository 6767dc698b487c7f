use crate::cli::ConfigAction;
use crate::config::Config;
use std::path::Path;

pub fn handle_config_action(action: ConfigAction, config_path: &Path, json_output: bool) {
    match action {
        ConfigAction::Init => match Config::default().save_to(config_path) {
            Ok(()) => {
                if json_output {
                    print_status("success", "Configuration initialized successfully");
                } else {
                    println!("Configuration initialized at: {}", config_path.display());
                }
            }
            Err(e) => fail(json_output, &format!("Failed to initialize config: {:#}", e)),
        },
        ConfigAction::Show => match Config::load_from(config_path) {
            Ok(config) => {
                if json_output {
                    match serde_json::to_string_pretty(&config) {
                        Ok(json) => println!("{}", json),
                        Err(e) => fail(false, &format!("Failed to serialize config to JSON: {}", e)),
                    }
                } else {
                    match config.to_commented_toml() {
                        Ok(toml_str) => {
                            println!("Configuration ({})", config_path.display());
                            println!("{}", toml_str);
                        }
                        Err(e) => fail(false, &format!("Failed to serialize config: {:#}", e)),
                    }
                }
            }
            Err(e) => fail(json_output, &format!("Failed to load config: {:#}", e)),
        },
        ConfigAction::Set { key, value } => match Config::load_from(config_path) {
            Ok(mut config) => match config.set_value(&key, &value) {
                Ok(()) => match config.save_to(config_path) {
                    Ok(()) => {
                        let message = format!("Configuration updated: {} = {}", key, value);
                        if json_output {
                            print_status("success", &message);
                        } else {
                            println!("{}", message);
                        }
                    }
                    Err(e) => fail(json_output, &format!("Failed to save config: {:#}", e)),
                },
                Err(e) => fail(json_output, &format!("Invalid configuration: {:#}", e)),
            },
            Err(e) => fail(json_output, &format!("Failed to load config: {:#}", e)),
        },
    }
}

fn print_status(status: &str, message: &str) {
    println!(
        "{}",
        serde_json::json!({ "status": status, "message": message })
    );
}

fn fail(json_output: bool, message: &str) -> ! {
    if json_output {
        print_status("error", message);
    } else {
        eprintln!("Error: {}", message);
    }
    std::process::exit(1);
}

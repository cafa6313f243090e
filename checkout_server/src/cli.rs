use std::{env, env::VarError};

/// The server takes its configuration from the environment. Any command line argument prints the help text and the
/// current (non-secret) settings.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{}\n", include_str!("./cli-help.txt"));
    print_settings();
    true
}

// Keys, webhook secrets and the JWT secret are never listed here.
const VISIBLE_SETTINGS: [(&str, &str); 9] = [
    ("RUST_LOG", "-"),
    ("CHECKOUT_HOST", "127.0.0.1"),
    ("CHECKOUT_PORT", "8360"),
    ("CHECKOUT_DATABASE_URL", "sqlite://data/checkout.db"),
    ("CHECKOUT_DEV_MODE", "false"),
    ("CHECKOUT_STATUS_POLL_INTERVAL", "3"),
    ("CHECKOUT_CURRENCY", "usd"),
    ("CHECKOUT_STRIPE_API_URL", "https://api.stripe.com"),
    ("CHECKOUT_STRIPE_WEBHOOK_TOLERANCE", "300"),
];

fn print_settings() {
    println!("Current environment values (EXCLUDING variables that contain secrets):");
    for (name, default) in VISIBLE_SETTINGS {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => format!("Not set (default: {default})"),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val}");
    }
}

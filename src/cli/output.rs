//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{CredentialRecord, Role};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a table of configured accounts
pub fn print_user_table(users: &[&CredentialRecord]) {
    if users.is_empty() {
        info("No users configured. Add [[auth.users]] entries to segmentd.toml");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Username").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Hash").fg(Color::Cyan),
        ]);

    for user in users {
        let role_color = match user.role {
            Role::Admin => Color::Yellow,
            Role::User => Color::Green,
        };
        let hash_ok = if bcrypt_hash_like(&user.password_hash) {
            "bcrypt"
        } else {
            "invalid"
        };

        table.add_row(vec![
            Cell::new(&user.username),
            Cell::new(user.role).fg(role_color),
            Cell::new(hash_ok),
        ]);
    }

    println!("{table}");
}

fn bcrypt_hash_like(hash: &str) -> bool {
    hash.len() == 60 && ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p))
}

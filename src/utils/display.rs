use colored::*;

use crate::core::message::{Message, Role};

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_notice(text: &str) {
    println!("{}", text.yellow());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

/// Render one history entry the way the chat view shows it.
pub fn print_message(message: &Message) {
    match message.role {
        Role::System => {}
        Role::User => println!("{} {}", "You:".yellow().bold(), message.content),
        Role::Assistant => println!("{} {}\n", "T-chai:".bright_cyan().bold(), message.content),
        Role::Info => println!("{}", message.content.dimmed()),
    }
}

pub fn print_history(messages: &[Message]) {
    for message in messages {
        print_message(message);
    }
}

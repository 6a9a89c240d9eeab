use cashbackapp::model::{Card, CardHistory, CardStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_COLUMN_WIDTH: usize = 28;
const TIME_WIDTH: usize = 16;

pub(super) enum MessageLevel {
    Info,
    Success,
    Warning,
}

pub(super) fn print_message(level: MessageLevel, message: &str) {
    match level {
        MessageLevel::Info => println!("{}", message.dimmed()),
        MessageLevel::Success => println!("{}", message.green()),
        MessageLevel::Warning => println!("{}", message.yellow()),
    }
}

pub(super) fn print_cards(cards: &[Card]) {
    if cards.is_empty() {
        println!("No cards found.");
        return;
    }

    let headers = ["ID", "Bank", "Card", "Category", "Cashback", "Changed", "Status"];
    let rows: Vec<[String; 7]> = cards.iter().map(card_row).collect();

    let mut widths = headers.map(|h| h.width());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.width()).min(MAX_COLUMN_WIDTH);
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(widths.iter())
        .map(|(h, w)| pad(h, *w))
        .collect();
    println!("{}", header_line.join("  ").bold());

    for (card, row) in cards.iter().zip(rows.iter()) {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| pad(cell, *w))
            .collect();
        let line = cells.join("  ");
        match card.status {
            CardStatus::Active => println!("{}", line),
            CardStatus::Expired => println!("{}", line.dimmed()),
        }
    }
}

pub(super) fn print_card(card: &Card) {
    let id = card.id.map(|id| id.to_string()).unwrap_or_default();
    println!("{} {} {}", id.yellow(), card.bank_name.bold(), card.card_name);
    println!("  Category:  {}", card.category);
    println!("  Cashback:  {}", format_rate(card.cashback).green());
    println!("  Changed:   {}", card.category_change_date);
    println!("  Status:    {}", status_label(card.status));
}

pub(super) fn print_history(records: &[CardHistory]) {
    if records.is_empty() {
        println!("No history found.");
        return;
    }
    for record in records {
        let category = truncate_to_width(&record.category, MAX_COLUMN_WIDTH);
        let padding = MAX_COLUMN_WIDTH.saturating_sub(category.width());
        println!(
            "{}  {}{}  {:>7}  {}",
            format_time_ago(record.recorded_at).dimmed(),
            category,
            " ".repeat(padding),
            format_rate(record.cashback),
            record.change_date
        );
    }
}

pub(super) fn print_list(values: &[String], empty: &str) {
    if values.is_empty() {
        println!("{}", empty);
        return;
    }
    for value in values {
        println!("{}", value);
    }
}

fn card_row(card: &Card) -> [String; 7] {
    [
        card.id.map(|id| id.to_string()).unwrap_or_default(),
        card.bank_name.clone(),
        card.card_name.clone(),
        card.category.clone(),
        format_rate(card.cashback),
        card.category_change_date.to_string(),
        card.status.to_string(),
    ]
}

fn status_label(status: CardStatus) -> colored::ColoredString {
    match status {
        CardStatus::Active => status.as_str().green(),
        CardStatus::Expired => status.as_str().red(),
    }
}

fn format_rate(rate: f64) -> String {
    format!("{}%", rate)
}

/// Truncate or right-pad `s` to exactly `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let padding = width.saturating_sub(truncated.width());
    format!("{}{}", truncated, " ".repeat(padding))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

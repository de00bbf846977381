use colored::{ColoredString, Colorize};

use crate::utils::{self, SizeBand};

fn paint_size(bytes: u64) -> ColoredString {
    let text = format!("{:>10}", utils::format_size(bytes));
    match SizeBand::of(bytes) {
        SizeBand::Large => text.red().bold(),
        SizeBand::Medium => text.yellow(),
        SizeBand::Small => text.green(),
    }
}

pub fn print_scan_header(root: &str) {
    println!("{}", format!("=== Virtual environments under {root} ===").bold().white());
}

pub fn print_selection_header() {
    println!("{}", "=== Selected virtual environments ===".bold().white());
}

pub fn print_venv(path: &str, bytes: u64) {
    println!(
        "  {}  {}  {}",
        paint_size(bytes),
        path,
        format!("[{}]", SizeBand::of(bytes).label()).dimmed()
    );
}

pub fn print_total(count: usize, bytes: u64) {
    println!();
    println!(
        "  {} {}",
        format!("{count} venv(s), total:").bold(),
        utils::format_size(bytes).green().bold()
    );
    println!();
}

pub fn print_nothing_found() {
    println!("  {}", "No virtual environments found.".dimmed());
}

pub fn print_content_line(line: &str, is_dir: bool) {
    if is_dir {
        println!("{}", line.cyan());
    } else {
        println!("{}", line.dimmed());
    }
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "Warning:".red().bold(), msg.red());
}

pub fn print_info(msg: &str) {
    println!("{} {}", "Info:".cyan().bold(), msg);
}

pub fn print_dry_run_footer() {
    println!(
        "{}",
        "This was a dry run. Run `venvsweep clean --confirm` to delete."
            .yellow()
            .bold()
    );
}

pub fn print_deleted(path: &str, bytes: u64) {
    println!(
        "  {} {}  {}",
        "Deleted".red(),
        path.dimmed(),
        utils::format_size(bytes).yellow()
    );
}

pub fn print_delete_error(path: &str, err: &str) {
    println!("  {} {}: {}", "Failed".red().bold(), path.dimmed(), err.red());
}

pub fn print_clean_complete(count: usize, freed: u64) {
    println!(
        "{} {}",
        "Cleaned!".green().bold(),
        format!("Deleted {count} venv(s), {} freed.", utils::format_size(freed)).green()
    );
}

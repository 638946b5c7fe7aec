use std::collections::HashMap;

use colored::{ColoredString, Colorize};
use once_cell::sync::Lazy;

pub struct PrintPrefix {
    pub text: ColoredString,
    pub padding: usize,
}

impl PrintPrefix {
    pub fn formatted(&self) -> String {
        format!("[{}]{:width$}", self.text, "", width = self.padding)
    }
}

static PREFIXES: Lazy<HashMap<&'static str, PrintPrefix>> = Lazy::new(|| {
    HashMap::from([
        (
            "info",
            PrintPrefix {
                text: "Info".bright_green(),
                padding: 4,
            },
        ),
        (
            "done",
            PrintPrefix {
                text: "Done".bright_green(),
                padding: 4,
            },
        ),
        (
            "skipped",
            PrintPrefix {
                text: "Skipped".green(),
                padding: 1,
            },
        ),
        (
            "warning",
            PrintPrefix {
                text: "Warning".yellow(),
                padding: 1,
            },
        ),
        (
            "failed",
            PrintPrefix {
                text: "Failed".red(),
                padding: 2,
            },
        ),
        (
            "error",
            PrintPrefix {
                text: "Error".bright_red(),
                padding: 3,
            },
        ),
    ])
});

pub fn prefix(tag_name: &str) -> String {
    PREFIXES
        .get(tag_name)
        .map_or_else(|| tag_name.to_string(), |tag| tag.formatted())
}

#[macro_export]
macro_rules! println_info {
    ($($arg:tt)*) => {{
        println!("{}", format!("{}{}", $crate::misc::prefix("info"), format!($($arg)*)));
        log::info!($($arg)*);
    }}
}

#[macro_export]
macro_rules! println_error {
    ($($arg:tt)*) => {{
        eprintln!("{}", format!("{}{}", $crate::misc::prefix("error"), format!($($arg)*)));
        log::error!($($arg)*);
    }}
}

pub fn human_readable_bytes(bytes: u64) -> String {
    let mut bytes = bytes as f64;
    let mut i = 0;
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    while bytes >= 1024.0 && i < UNITS.len() - 1 {
        bytes /= 1024.0;
        i += 1;
    }
    format!("{bytes:.2}{}", UNITS[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(s)).unwrap()
    }

    #[test]
    fn test_prefixes_align() {
        for tag in ["info", "done", "skipped", "warning", "failed", "error"] {
            assert_eq!(plain(&prefix(tag)).len(), 10, "prefix {tag}");
        }
    }

    #[test]
    fn test_unknown_prefix_is_passed_through() {
        assert_eq!(prefix("renamed"), "renamed");
    }

    #[test]
    fn test_human_readable_bytes() {
        assert_eq!(human_readable_bytes(512), "512.00B");
        assert_eq!(human_readable_bytes(400 * 1024), "400.00KB");
        assert_eq!(human_readable_bytes(3 * 1024 * 1024 / 2), "1.50MB");
    }
}

//! Output formatting utilities for CLI commands

use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Wrap `text` in an ANSI color when stderr is a terminal.
pub fn color(code: &str, text: &str) -> String {
    if io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Log info message (respects quiet flag)
pub fn log_info(msg: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", msg);
    }
}

/// Write output to file or stdout
pub fn write_output(content: &str, path: Option<&str>) -> Result<(), String> {
    if let Some(path) = path {
        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write to {}: {}", path, e))?;
    } else {
        print!("{}", content);
        io::stdout()
            .flush()
            .map_err(|e| format!("Failed to flush stdout: {}", e))?;
    }
    Ok(())
}

/// Serialize as pretty JSON with a trailing newline
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| format!("Failed to serialize output: {}", e))
}

/// Serialize one object per line
pub fn to_jsonl<T: Serialize>(items: &[T]) -> Result<String, String> {
    let mut out = String::new();
    for item in items {
        let line =
            serde_json::to_string(item).map_err(|e| format!("Failed to serialize output: {}", e))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonl_one_line_per_item() {
        let out = to_jsonl(&[1, 2, 3]).unwrap();
        assert_eq!(out, "1\n2\n3\n");
        assert!(to_jsonl::<u8>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_json_trailing_newline() {
        assert!(to_json(&vec!["a"]).unwrap().ends_with("]\n"));
    }
}

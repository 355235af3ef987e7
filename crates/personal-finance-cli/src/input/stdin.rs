use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Typed input piped on stdin, or None when stdin is a terminal or carries
/// only whitespace.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let parsed = serde_json::from_str(trimmed)
        .map_err(|e| format!("Piped stdin is not a valid {}: {}", input_name::<T>(), e))?;
    Ok(Some(parsed))
}

/// `LoanInput` rather than `personal_finance_core::loans::emi::LoanInput`.
fn input_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

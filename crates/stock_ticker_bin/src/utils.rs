/// Keep only characters that can appear in an exchange symbol, capped at 20, upper-cased.
pub fn sanitize_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .take(20)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect::<String>()
        .to_uppercase()
}

/// Lenient boolean used for flag-like environment variables.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

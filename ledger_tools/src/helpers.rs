/// Decodes a hex string into UTF-8 text. Returns `None` for invalid hex or invalid UTF-8.
pub fn decode_hex_utf8(hex_str: &str) -> Option<String> {
    let bytes = hex::decode(hex_str.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Encodes text as upper-case hex, the form the ledger uses for memo fields.
pub fn encode_hex_utf8(text: &str) -> String {
    hex::encode_upper(text.as_bytes())
}

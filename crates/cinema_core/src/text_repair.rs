//! crates/cinema_core/src/text_repair.rs
//!
//! Best-effort repair of text that a database client decoded with the wrong
//! character set. The heuristic is lossy: it cannot tell whether a value needed
//! fixing, and correct non-ASCII Latin text comes out garbled. It is therefore
//! opt-in through `TextRepair`.

use std::fmt;
use std::str::FromStr;

use encoding_rs::WINDOWS_1251;

/// Whether rows coming out of the database are passed through `repair_text`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextRepair {
    #[default]
    Off,
    /// Undo a Latin-1 mis-decode, trying UTF-8 first and Windows-1251 second.
    Latin1,
}

impl TextRepair {
    pub fn apply(&self, value: String) -> String {
        match self {
            TextRepair::Off => value,
            TextRepair::Latin1 => repair_text(&value),
        }
    }

    pub fn apply_opt(&self, value: Option<String>) -> Option<String> {
        value.map(|v| self.apply(v))
    }
}

impl FromStr for TextRepair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "" => Ok(TextRepair::Off),
            "latin1" => Ok(TextRepair::Latin1),
            other => Err(format!("'{}' is not one of: off, latin1", other)),
        }
    }
}

impl fmt::Display for TextRepair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextRepair::Off => write!(f, "off"),
            TextRepair::Latin1 => write!(f, "latin1"),
        }
    }
}

/// Re-encodes `value` as Latin-1 and decodes the bytes as UTF-8, falling back
/// to Windows-1251. Returns `value` unchanged when it has no Latin-1 form.
pub fn repair_text(value: &str) -> String {
    let Some(bytes) = latin1_bytes(value) else {
        return value.to_string();
    };

    match String::from_utf8(bytes) {
        Ok(fixed) => fixed,
        Err(e) => decode_windows_1251(&e.into_bytes()).unwrap_or_else(|| value.to_string()),
    }
}

/// Byte 0x98 has no character in Windows-1251. encoding_rs maps it to U+0098
/// like every WHATWG single-byte table, so it is rejected up front.
const WINDOWS_1251_UNDEFINED: u8 = 0x98;

fn decode_windows_1251(bytes: &[u8]) -> Option<String> {
    if bytes.contains(&WINDOWS_1251_UNDEFINED) {
        return None;
    }
    WINDOWS_1251
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|decoded| decoded.into_owned())
}

fn latin1_bytes(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What a client produces when it reads UTF-8 bytes as Latin-1.
    fn as_latin1(original: &str) -> String {
        original.bytes().map(char::from).collect()
    }

    #[test]
    fn utf8_read_as_latin1_is_restored() {
        let garbled = as_latin1("Брат 2");
        assert_ne!(garbled, "Брат 2");
        assert_eq!(repair_text(&garbled), "Брат 2");
    }

    #[test]
    fn windows_1251_read_as_latin1_is_restored() {
        // "Привет" encoded as Windows-1251, then read byte-for-byte as Latin-1.
        let garbled = "\u{cf}\u{f0}\u{e8}\u{e2}\u{e5}\u{f2}";
        assert_eq!(repair_text(garbled), "Привет");
    }

    #[test]
    fn text_without_latin1_form_is_returned_unmodified() {
        assert_eq!(repair_text("Сталкер"), "Сталкер");
        assert_eq!(repair_text("映画 🎬"), "映画 🎬");
    }

    #[test]
    fn text_failing_both_decodes_is_returned_unmodified() {
        // Latin-1 encodable, invalid UTF-8, and 0x98 is undefined in Windows-1251.
        assert_eq!(repair_text("A\u{98}B"), "A\u{98}B");
        assert_eq!(repair_text("\u{e9}\u{98}"), "\u{e9}\u{98}");
    }

    #[test]
    fn windows_1251_rejects_its_undefined_byte() {
        assert_eq!(decode_windows_1251(&[0x41, 0x98, 0x42]), None);
        assert_eq!(decode_windows_1251(&[0xcf, 0xf0]).as_deref(), Some("Пр"));
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(repair_text("The Matrix (1999)"), "The Matrix (1999)");
        assert_eq!(repair_text(""), "");
    }

    #[test]
    fn correct_latin_text_is_not_safe() {
        // The heuristic cannot know "é" was already right.
        assert_ne!(repair_text("Amélie"), "Amélie");
    }

    #[test]
    fn off_mode_is_identity() {
        let garbled = as_latin1("Брат");
        assert_eq!(TextRepair::Off.apply(garbled.clone()), garbled);
        assert_eq!(TextRepair::Latin1.apply(garbled), "Брат");
        assert_eq!(TextRepair::Latin1.apply_opt(None), None);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("off".parse::<TextRepair>(), Ok(TextRepair::Off));
        assert_eq!("LATIN1".parse::<TextRepair>(), Ok(TextRepair::Latin1));
        assert!("cp866".parse::<TextRepair>().is_err());
        assert_eq!(TextRepair::Latin1.to_string(), "latin1");
    }
}

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Character set used on the control and listing channels when a session has
/// not switched to UTF-8 with `OPTS UTF8 ON`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Charset {
    #[default]
    #[serde(rename = "utf-8", alias = "UTF-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "iso-8859-1", alias = "ISO-8859-1", alias = "latin1")]
    Latin1,
}

impl Charset {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    /// Characters outside the charset are sent as `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

/// Decodes a received command line. UTF-8 sessions get NFC composition so
/// decomposed accents from some clients match stored names.
pub fn decode_command(bytes: &[u8], utf8: bool, charset: Charset) -> String {
    if utf8 {
        String::from_utf8_lossy(bytes).nfc().collect()
    } else {
        charset.decode(bytes)
    }
}

pub fn encode_text(text: &str, utf8: bool, charset: Charset) -> Vec<u8> {
    if utf8 {
        text.as_bytes().to_vec()
    } else {
        charset.encode(text)
    }
}

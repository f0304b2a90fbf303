// src/screener/registry.rs
//! Catalog of the signal types the XTUMY strategies emit.
//!
//! Internally a signal type is always its canonical code (`PULLBACK_AL`).
//! The server speaks in labels (`PULLBACK AL`), so translation happens only
//! when decoding responses, encoding requests and rendering.

use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical signal-type identifier. Unknown codes are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalType(String);

impl SignalType {
    /// Accepts either a code or a label and resolves registry aliases.
    pub fn new(raw: &str) -> Self {
        let code = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_uppercase();

        match SignalTypeRegistry::builtin().resolve_alias(&code) {
            Some(info) => Self(info.code.to_string()),
            None => Self(code),
        }
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> String {
        match SignalTypeRegistry::builtin().lookup(self) {
            Some(info) => info.label.to_string(),
            None => self.0.replace('_', " "),
        }
    }

    pub fn color(&self) -> Color {
        SignalTypeRegistry::builtin()
            .lookup(self)
            .map(|info| info.color)
            .unwrap_or(Color::Blue)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<&str> for SignalType {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// The screener API filters with `signal_type in signal_types`, so the label is the wire form.
impl Serialize for SignalType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for SignalType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

#[derive(Debug)]
pub struct SignalTypeInfo {
    pub code: &'static str,
    pub label: &'static str,
    pub color: Color,
    aliases: &'static [&'static str],
}

static BUILTIN: [SignalTypeInfo; 7] = [
    SignalTypeInfo {
        code: "KURUMSAL_DİP",
        label: "KURUMSAL DİP",
        color: Color::Gray,
        aliases: &["KURUMSAL_DIP"],
    },
    SignalTypeInfo {
        code: "TREND_BAŞLANGIÇ",
        label: "TREND BAŞLANGIÇ",
        color: Color::Magenta,
        aliases: &["TREND_BASLANGIC"],
    },
    SignalTypeInfo {
        code: "PULLBACK_AL",
        label: "PULLBACK AL",
        color: Color::Blue,
        aliases: &[],
    },
    SignalTypeInfo {
        code: "DİP_AL",
        label: "DİP AL",
        color: Color::Cyan,
        aliases: &["DIP_AL"],
    },
    SignalTypeInfo {
        code: "ALTIN_KIRILIM",
        label: "ALTIN KIRILIM",
        color: Color::Yellow,
        aliases: &[],
    },
    SignalTypeInfo {
        code: "ZİRVE_KIRILIMI",
        label: "ZİRVE KIRILIMI",
        color: Color::Rgb(249, 115, 22),
        aliases: &["ZIRVE_KIRILIMI"],
    },
    SignalTypeInfo {
        code: "DİRENÇ_REDDİ",
        label: "DİRENÇ REDDİ",
        color: Color::Red,
        aliases: &["DIRENC_REDDI"],
    },
];

/// Ordered view over a static table of signal types.
#[derive(Debug, Clone, Copy)]
pub struct SignalTypeRegistry {
    entries: &'static [SignalTypeInfo],
}

impl SignalTypeRegistry {
    pub const fn new(entries: &'static [SignalTypeInfo]) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(&BUILTIN)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn all(&self) -> impl Iterator<Item = SignalType> + '_ {
        self.entries
            .iter()
            .map(|info| SignalType(info.code.to_string()))
    }

    pub fn lookup(&self, signal_type: &SignalType) -> Option<&'static SignalTypeInfo> {
        self.entries
            .iter()
            .find(|info| info.code == signal_type.code())
    }

    fn resolve_alias(&self, code: &str) -> Option<&'static SignalTypeInfo> {
        self.entries
            .iter()
            .find(|info| info.code == code || info.aliases.contains(&code))
    }

    /// First type in registry order that is not in `visible`.
    pub fn first_missing(&self, visible: &[SignalType]) -> Option<SignalType> {
        self.all().find(|t| !visible.contains(t))
    }

    pub fn default_visible(&self, count: usize) -> Vec<SignalType> {
        self.all().take(count).collect()
    }
}

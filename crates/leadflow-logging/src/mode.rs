//! Log routing mode.

use std::{convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which sink application log entries go to.
///
/// Parsing is lenient: anything other than `remote` or `both`
/// (case-insensitive, surrounding whitespace ignored) selects `Local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum LogMode {
    /// Process diagnostic stream only.
    #[default]
    Local,
    /// Log queue only.
    Remote,
    /// Diagnostic stream, then log queue.
    Both,
}

impl LogMode {
    /// Parses a mode setting, falling back to `Local`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Self::Remote,
            "both" => Self::Both,
            _ => Self::Local,
        }
    }

    /// Setting spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Both => "both",
        }
    }

    /// Whether entries are forwarded to the log queue.
    pub const fn uses_remote(self) -> bool {
        matches!(self, Self::Remote | Self::Both)
    }
}

impl From<String> for LogMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl FromStr for LogMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!(LogMode::parse("local"), LogMode::Local);
        assert_eq!(LogMode::parse("remote"), LogMode::Remote);
        assert_eq!(LogMode::parse(" Both "), LogMode::Both);
    }

    #[test]
    fn unknown_mode_falls_back_to_local() {
        for value in ["", "cloudwatch", "remote,local", "none"] {
            assert_eq!(LogMode::parse(value), LogMode::Local, "{value:?}");
        }
    }

    #[test]
    fn deserializes_leniently() {
        let mode: LogMode = serde_json::from_str("\"syslog\"").unwrap();
        assert_eq!(mode, LogMode::Local);

        let mode: LogMode = serde_json::from_str("\"REMOTE\"").unwrap();
        assert_eq!(mode, LogMode::Remote);
    }
}

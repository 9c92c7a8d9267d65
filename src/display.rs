use std::io::IsTerminal;

use crate::repo_status::StatusTone;

/// Glyphs used when rendering cards to a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub synced: &'static str,
    pub pending: &'static str,
    pub error: &'static str,
    pub stale: &'static str,
    pub master: &'static str,
    pub time: &'static str,
    pub url: &'static str,
}

impl Symbols {
    pub const FANCY: Symbols = Symbols {
        synced: "✓",
        pending: "🔄",
        error: "❌",
        stale: "⚠️",
        master: "★",
        time: "🕒",
        url: "📁",
    };

    pub const PLAIN: Symbols = Symbols {
        synced: "[OK]",
        pending: "[..]",
        error: "[X]",
        stale: "!",
        master: "*",
        time: "@",
        url: "#",
    };

    pub fn for_tone(&self, tone: StatusTone) -> &'static str {
        match tone {
            StatusTone::Success => self.synced,
            StatusTone::InProgress => self.pending,
            StatusTone::Error => self.error,
        }
    }

    /// Pick a symbol set. An explicit `plain_text` setting wins; otherwise the
    /// environment and terminal decide.
    pub fn detect(plain_text: Option<bool>) -> Symbols {
        match plain_text {
            Some(true) => Self::PLAIN,
            Some(false) => Self::FANCY,
            None => Self::from_env(),
        }
    }

    fn from_env() -> Symbols {
        // Explicit overrides
        if std::env::var("REPODASH_PLAIN_TEXT").is_ok() {
            return Self::PLAIN;
        }
        if std::env::var("REPODASH_FANCY").is_ok() {
            return Self::FANCY;
        }

        // Pipe or redirect
        if !std::io::stdout().is_terminal() {
            return Self::PLAIN;
        }

        if std::env::var("NO_COLOR").is_ok() {
            return Self::PLAIN;
        }

        if let Ok(term) = std::env::var("TERM") {
            let term = term.to_lowercase();
            if term == "dumb" || term == "vt100" || term.contains("linux") {
                return Self::PLAIN;
            }
        }

        Self::FANCY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn explicit_setting_wins() {
        assert_eq!(Symbols::detect(Some(true)), Symbols::PLAIN);
        assert_eq!(Symbols::detect(Some(false)), Symbols::FANCY);
    }

    #[test]
    #[serial]
    fn plain_text_env_override() {
        std::env::set_var("REPODASH_PLAIN_TEXT", "1");
        let symbols = Symbols::detect(None);
        std::env::remove_var("REPODASH_PLAIN_TEXT");
        assert_eq!(symbols, Symbols::PLAIN);
    }

    #[test]
    fn tone_symbols() {
        let s = Symbols::PLAIN;
        assert_eq!(s.for_tone(StatusTone::Success), "[OK]");
        assert_eq!(s.for_tone(StatusTone::InProgress), "[..]");
        assert_eq!(s.for_tone(StatusTone::Error), "[X]");
    }
}

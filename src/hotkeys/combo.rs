//! Parsing and formatting of global shortcut combos.
//!
//! Two spellings are accepted: macOS symbol form ("⌘⇧v") and word form
//! ("cmd+shift+v"). Either way a combo must carry at least one modifier
//! and resolve to a known base key; the system copy/paste/cut/undo
//! combos are always rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComboParseError {
    #[error("empty shortcut")]
    Empty,
    #[error("no base key in shortcut")]
    MissingKey,
    #[error("at least one modifier is required")]
    NoModifier,
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("unknown token '{0}'")]
    UnknownToken(String),
    #[error("the Fn/Globe key cannot be registered")]
    FnKeyUnsupported,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub cmd: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub caps: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.cmd || self.shift || self.ctrl || self.alt || self.caps
    }

    fn only_cmd(&self) -> bool {
        self.cmd && !self.shift && !self.ctrl && !self.alt && !self.caps
    }
}

/// A parsed modifier+key combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combo {
    /// Canonical lowercase key name, e.g. "v", "f5", "space".
    pub key: String,
    pub modifiers: Modifiers,
}

impl Combo {
    pub fn parse(raw: &str) -> Result<Self, ComboParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ComboParseError::Empty);
        }
        if trimmed.contains('🌐') {
            return Err(ComboParseError::FnKeyUnsupported);
        }
        let combo = if trimmed.chars().any(is_modifier_symbol) {
            parse_symbol_form(trimmed)?
        } else {
            parse_word_form(trimmed)?
        };
        if !combo.modifiers.any() {
            return Err(ComboParseError::NoModifier);
        }
        Ok(combo)
    }

    /// True for the system combos that must never be shadowed:
    /// ⌘C, ⌘V, ⌘X, ⌘Z.
    pub fn is_reserved(&self) -> bool {
        self.modifiers.only_cmd() && matches!(self.key.as_str(), "c" | "v" | "x" | "z")
    }

    /// Stable identity string, e.g. "cmd+shift+v". Modifiers appear in a
    /// fixed alphabetical order so equal combos compare equal as strings.
    pub fn canonical(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.alt {
            parts.push("alt");
        }
        if self.modifiers.caps {
            parts.push("caps");
        }
        if self.modifiers.cmd {
            parts.push("cmd");
        }
        if self.modifiers.ctrl {
            parts.push("ctrl");
        }
        if self.modifiers.shift {
            parts.push("shift");
        }
        parts.push(&self.key);
        parts.join("+")
    }

    /// macOS-style symbol rendering, e.g. "⌃⌥⇧⌘V".
    pub fn display_macos(&self) -> String {
        let mut out = String::new();
        if self.modifiers.caps {
            out.push('⇪');
        }
        if self.modifiers.ctrl {
            out.push('⌃');
        }
        if self.modifiers.alt {
            out.push('⌥');
        }
        if self.modifiers.shift {
            out.push('⇧');
        }
        if self.modifiers.cmd {
            out.push('⌘');
        }
        let key = match self.key.as_str() {
            "space" => "␣".to_string(),
            "tab" => "⇥".to_string(),
            "enter" => "⏎".to_string(),
            "escape" => "⎋".to_string(),
            "backspace" => "⌫".to_string(),
            "delete" => "⌦".to_string(),
            "up" => "↑".to_string(),
            "down" => "↓".to_string(),
            "left" => "←".to_string(),
            "right" => "→".to_string(),
            other => other.to_uppercase(),
        };
        out.push_str(&key);
        out
    }
}

fn is_modifier_symbol(c: char) -> bool {
    matches!(c, '⌘' | '⇧' | '⌃' | '⌥' | '⇪')
}

fn parse_symbol_form(raw: &str) -> Result<Combo, ComboParseError> {
    let mut modifiers = Modifiers::default();
    let mut rest = String::new();
    for c in raw.chars() {
        match c {
            '⌘' => modifiers.cmd = true,
            '⇧' => modifiers.shift = true,
            '⌃' => modifiers.ctrl = true,
            '⌥' => modifiers.alt = true,
            '⇪' => modifiers.caps = true,
            other => rest.push(other),
        }
    }
    let key = canonicalize_key(&rest)?;
    Ok(Combo { key, modifiers })
}

fn parse_word_form(raw: &str) -> Result<Combo, ComboParseError> {
    let tokens: Vec<&str> = raw
        .split(|c: char| c == '+' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(ComboParseError::Empty);
    }
    let mut modifiers = Modifiers::default();
    let mut key: Option<String> = None;
    let last = tokens.len() - 1;
    for (i, token) in tokens.iter().enumerate() {
        match token.to_lowercase().as_str() {
            "cmd" | "command" | "meta" | "super" => modifiers.cmd = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "opt" | "option" => modifiers.alt = true,
            "shift" => modifiers.shift = true,
            "caps" | "capslock" => modifiers.caps = true,
            "fn" | "globe" => return Err(ComboParseError::FnKeyUnsupported),
            other => {
                if i != last {
                    return Err(ComboParseError::UnknownToken(other.to_string()));
                }
                key = Some(canonicalize_key(other)?);
            }
        }
    }
    let key = key.ok_or(ComboParseError::MissingKey)?;
    Ok(Combo { key, modifiers })
}

/// Normalize a key token to its canonical name.
fn canonicalize_key(token: &str) -> Result<String, ComboParseError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ComboParseError::MissingKey);
    }
    let lower = token.to_lowercase();
    let name = match lower.as_str() {
        " " | "␣" | "space" => "space",
        "⇥" | "tab" => "tab",
        "⏎" | "↩" | "enter" | "return" => "enter",
        "⎋" | "escape" | "esc" => "escape",
        "⌫" | "backspace" => "backspace",
        "⌦" | "delete" | "del" => "delete",
        "↑" | "up" => "up",
        "↓" | "down" => "down",
        "←" | "left" => "left",
        "→" | "right" => "right",
        "home" => "home",
        "end" => "end",
        "pageup" => "pageup",
        "pagedown" => "pagedown",
        ";" | "semicolon" => "semicolon",
        "'" | "quote" => "quote",
        "," | "comma" => "comma",
        "." | "period" => "period",
        "/" | "slash" => "slash",
        "\\" | "backslash" => "backslash",
        "[" | "bracketleft" => "bracketleft",
        "]" | "bracketright" => "bracketright",
        "-" | "minus" => "minus",
        "=" | "equal" => "equal",
        "`" | "backquote" => "backquote",
        "fn" | "globe" => return Err(ComboParseError::FnKeyUnsupported),
        _ => {
            if lower.len() == 1 && lower.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Ok(lower);
            }
            if let Some(num) = lower.strip_prefix('f') {
                if matches!(num.parse::<u8>(), Ok(1..=12)) {
                    return Ok(lower);
                }
            }
            return Err(ComboParseError::UnknownKey(token.to_string()));
        }
    };
    Ok(name.to_string())
}

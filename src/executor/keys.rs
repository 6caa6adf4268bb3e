//! Key-name translation for hotkeys the model asks for.
//!
//! Names follow the common automation vocabulary (`ctrl`, `enter`, `pgdn`,
//! `f5`, single characters) and are matched case-insensitively.
use std::sync::OnceLock;

use enigo::Key;
use regex::Regex;

use crate::errors::{PilotError, PilotResult};

fn function_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^f([1-9]|1[0-2])$").expect("static regex"))
}

pub fn map_key(name: &str) -> PilotResult<Key> {
    let lower = name.trim().to_lowercase();
    let key = match lower.as_str() {
        "ctrl" | "control" => Key::Control,
        "shift" => Key::Shift,
        "alt" | "option" => Key::Alt,
        "win" | "super" | "meta" | "cmd" | "command" => Key::Meta,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "space" => Key::Space,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "capslock" => Key::CapsLock,
        other => {
            if let Some(caps) = function_key_re().captures(other) {
                return function_key(&caps[1]);
            }
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                // " " trims to nothing; treat it as the space bar.
                (None, _) if !name.is_empty() => Key::Space,
                _ => return Err(PilotError::Executor(format!("Unsupported key: {name:?}"))),
            }
        }
    };
    Ok(key)
}

fn function_key(n: &str) -> PilotResult<Key> {
    Ok(match n {
        "1" => Key::F1,
        "2" => Key::F2,
        "3" => Key::F3,
        "4" => Key::F4,
        "5" => Key::F5,
        "6" => Key::F6,
        "7" => Key::F7,
        "8" => Key::F8,
        "9" => Key::F9,
        "10" => Key::F10,
        "11" => Key::F11,
        "12" => Key::F12,
        _ => return Err(PilotError::Executor(format!("Unsupported function key: f{n}"))),
    })
}

/// Map every name up front so a bad name fails before anything is pressed.
pub fn map_chord(names: &[String]) -> PilotResult<Vec<Key>> {
    names.iter().map(|n| map_key(n)).collect()
}

/// The platform's paste chord.
pub fn paste_chord() -> Vec<String> {
    let modifier = if cfg!(target_os = "macos") { "command" } else { "ctrl" };
    vec![modifier.to_string(), "v".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_and_aliases() {
        assert_eq!(map_key("CTRL").unwrap(), Key::Control);
        assert_eq!(map_key("control").unwrap(), Key::Control);
        assert_eq!(map_key("Return").unwrap(), Key::Return);
        assert_eq!(map_key("esc").unwrap(), Key::Escape);
        assert_eq!(map_key("cmd").unwrap(), Key::Meta);
        assert_eq!(map_key("pgdn").unwrap(), Key::PageDown);
    }

    #[test]
    fn function_keys() {
        assert_eq!(map_key("f5").unwrap(), Key::F5);
        assert_eq!(map_key("F12").unwrap(), Key::F12);
        assert!(map_key("f13").is_err());
    }

    #[test]
    fn single_characters_are_lowercased() {
        assert_eq!(map_key("V").unwrap(), Key::Unicode('v'));
        assert_eq!(map_key("/").unwrap(), Key::Unicode('/'));
        assert_eq!(map_key(" ").unwrap(), Key::Space);
    }

    #[test]
    fn unknown_names_fail() {
        assert!(map_key("hyper").is_err());
        assert!(map_key("").is_err());
    }

    #[test]
    fn chord_fails_as_a_whole() {
        let ok = map_chord(&["ctrl".into(), "shift".into(), "t".into()]).unwrap();
        assert_eq!(ok, vec![Key::Control, Key::Shift, Key::Unicode('t')]);
        assert!(map_chord(&["ctrl".into(), "bogus".into()]).is_err());
    }

    #[test]
    fn paste_chord_ends_with_v() {
        assert_eq!(paste_chord().last().map(String::as_str), Some("v"));
    }
}

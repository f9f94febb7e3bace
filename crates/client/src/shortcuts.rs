//! Keyboard shortcuts.
//!
//! ```rust,ignore
//! let mut shortcuts = ShortcutMap::new();
//! shortcuts.bind(Shortcut::parse("mod+k")?, move || search_open.set(true));
//!
//! rsx! { div { onkeydown: move |e| { shortcuts.dispatch(&KeyPress::from(&*e.data())); } } }
//! ```

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    Empty,
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("shortcut `{0}` has no key")]
    MissingKey(String),
}

/// A key event reduced to what shortcut matching looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPress {
    /// `KeyboardEvent.key`, e.g. `"k"`, `"K"`, `"Enter"`.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

impl From<&dioxus::prelude::KeyboardData> for KeyPress {
    fn from(event: &dioxus::prelude::KeyboardData) -> Self {
        use dioxus::prelude::*;

        let modifiers = event.modifiers();
        Self {
            key: event.key().to_string(),
            ctrl: modifiers.ctrl(),
            shift: modifiers.shift(),
            alt: modifiers.alt(),
            meta: modifiers.meta(),
        }
    }
}

/// A key plus the exact set of modifiers that must be held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    key: String,
    ctrl: bool,
    shift: bool,
    alt: bool,
    meta: bool,
}

impl Shortcut {
    /// Parse `"ctrl+shift+k"`-style strings.
    ///
    /// Modifiers: `ctrl`/`control`, `shift`, `alt`/`option`, `meta`/`cmd`,
    /// and `mod`, which is `meta` on macOS and `ctrl` elsewhere.
    pub fn parse(spec: &str) -> Result<Self, ShortcutError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut parts: Vec<&str> = spec.split('+').map(str::trim).collect();
        // "ctrl++" binds the plus key itself.
        if spec.ends_with("++") {
            parts.truncate(parts.len() - 2);
            parts.push("+");
        }
        let key = match parts.pop() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ShortcutError::MissingKey(spec.to_string())),
        };

        let mut shortcut = Shortcut {
            key: normalize_key(key),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        };
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => shortcut.ctrl = true,
                "shift" => shortcut.shift = true,
                "alt" | "option" => shortcut.alt = true,
                "meta" | "cmd" | "command" | "super" => shortcut.meta = true,
                "mod" => {
                    if cfg!(target_os = "macos") {
                        shortcut.meta = true;
                    } else {
                        shortcut.ctrl = true;
                    }
                }
                _ => return Err(ShortcutError::UnknownModifier(modifier.to_string())),
            }
        }
        Ok(shortcut)
    }

    /// Key matches case-insensitively and all four modifier flags are equal.
    pub fn matches(&self, press: &KeyPress) -> bool {
        normalize_key(&press.key) == self.key
            && press.ctrl == self.ctrl
            && press.shift == self.shift
            && press.alt == self.alt
            && press.meta == self.meta
    }
}

fn normalize_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "esc" => "escape".to_string(),
        "space" | "spacebar" => " ".to_string(),
        "del" => "delete".to_string(),
        "up" => "arrowup".to_string(),
        "down" => "arrowdown".to_string(),
        "left" => "arrowleft".to_string(),
        "right" => "arrowright".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (held, name) in [
            (self.ctrl, "ctrl"),
            (self.alt, "alt"),
            (self.shift, "shift"),
            (self.meta, "meta"),
        ] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        match self.key.as_str() {
            " " => write!(f, "space"),
            key => write!(f, "{key}"),
        }
    }
}

/// Ordered shortcut bindings; the first match wins.
#[derive(Default)]
pub struct ShortcutMap {
    bindings: Vec<(Shortcut, Box<dyn FnMut()>)>,
}

impl fmt::Debug for ShortcutMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.bindings.iter().map(|(s, _)| s.to_string()))
            .finish()
    }
}

impl ShortcutMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, shortcut: Shortcut, handler: impl FnMut() + 'static) -> &mut Self {
        self.bindings.push((shortcut, Box::new(handler)));
        self
    }

    /// Parse and bind in one step.
    pub fn bind_str(
        &mut self,
        spec: &str,
        handler: impl FnMut() + 'static,
    ) -> Result<&mut Self, ShortcutError> {
        let shortcut = Shortcut::parse(spec)?;
        Ok(self.bind(shortcut, handler))
    }

    /// Run the first handler whose shortcut matches. Returns whether one ran.
    pub fn dispatch(&mut self, press: &KeyPress) -> bool {
        match self.bindings.iter_mut().find(|(s, _)| s.matches(press)) {
            Some((shortcut, handler)) => {
                crate::log_debug!("shortcut {} fired", shortcut);
                handler();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn parses_modifiers_and_aliases() {
        let s = Shortcut::parse("Ctrl+Shift+K").unwrap();
        assert!(s.matches(&KeyPress::new("k").ctrl().shift()));
        assert_eq!(s.to_string(), "ctrl+shift+k");

        let s = Shortcut::parse("option+cmd+esc").unwrap();
        assert!(s.matches(&KeyPress::new("Escape").alt().meta()));

        let s = Shortcut::parse("ctrl++").unwrap();
        assert!(s.matches(&KeyPress::new("+").ctrl()));
    }

    #[test]
    fn mod_is_the_platform_primary_modifier() {
        let s = Shortcut::parse("mod+s").unwrap();
        let press = if cfg!(target_os = "macos") {
            KeyPress::new("s").meta()
        } else {
            KeyPress::new("s").ctrl()
        };
        assert!(s.matches(&press));
    }

    #[test]
    fn rejects_bad_specs() {
        assert_eq!(Shortcut::parse(""), Err(ShortcutError::Empty));
        assert_eq!(
            Shortcut::parse("hyper+k"),
            Err(ShortcutError::UnknownModifier("hyper".into()))
        );
        assert!(matches!(
            Shortcut::parse("ctrl+"),
            Err(ShortcutError::MissingKey(_))
        ));
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let s = Shortcut::parse("ctrl+k").unwrap();
        assert!(s.matches(&KeyPress::new("K").ctrl()));
        assert!(!s.matches(&KeyPress::new("k")));
        assert!(!s.matches(&KeyPress::new("k").ctrl().shift()));
        assert!(!s.matches(&KeyPress::new("k").meta()));
        assert!(!s.matches(&KeyPress::new("j").ctrl()));
    }

    #[test]
    fn dispatch_runs_the_first_match_only() {
        let fired = Rc::new(Cell::new(0));
        let mut map = ShortcutMap::new();

        let first = fired.clone();
        map.bind_str("ctrl+k", move || first.set(first.get() + 1))
            .unwrap();
        let second = fired.clone();
        map.bind_str("ctrl+k", move || second.set(second.get() + 100))
            .unwrap();

        assert!(map.dispatch(&KeyPress::new("k").ctrl()));
        assert!(!map.dispatch(&KeyPress::new("k").ctrl().alt()));
        assert_eq!(fired.get(), 1);
    }
}

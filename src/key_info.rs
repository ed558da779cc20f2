//! Key information telemetry widget
//!
//! Shows details about the most recent key: where it sits on the split
//! layout, what it sends, the active layer and modifiers, and how long it was
//! held. Five text labels, refreshed on every event and periodically while a
//! key is held.

use std::time::{Duration, Instant};

use bongo_engine::{ActivitySide, SplitBoundary};

/// Modifier bits as carried by modifier state events
pub mod mods {
    pub const LCTRL: u8 = 0x01;
    pub const LSHIFT: u8 = 0x02;
    pub const LALT: u8 = 0x04;
    pub const LGUI: u8 = 0x08;
    pub const RCTRL: u8 = 0x10;
    pub const RSHIFT: u8 = 0x20;
    pub const RALT: u8 = 0x40;
    pub const RGUI: u8 = 0x80;
}

/// Display order for modifier names
const MODIFIER_NAMES: [(u8, &str); 8] = [
    (mods::LCTRL, "LCTL"),
    (mods::LSHIFT, "LSFT"),
    (mods::LALT, "LALT"),
    (mods::LGUI, "LGUI"),
    (mods::RCTRL, "RCTL"),
    (mods::RSHIFT, "RSFT"),
    (mods::RALT, "RALT"),
    (mods::RGUI, "RGUI"),
];

/// Short label for a HID keyboard usage code, or `KC_0x....` if unnamed
pub fn keycode_label(code: u16) -> String {
    let name = match code {
        0x04..=0x1D => {
            // A..Z
            let letter = char::from(b'A' + (code - 0x04) as u8);
            return letter.to_string();
        }
        0x1E..=0x26 => {
            // 1..9
            let digit = char::from(b'1' + (code - 0x1E) as u8);
            return digit.to_string();
        }
        0x27 => "0",
        0x28 => "ENTER",
        0x29 => "ESC",
        0x2A => "BKSP",
        0x2B => "TAB",
        0x2C => "SPACE",
        0x2D => "-",
        0x2E => "=",
        0x2F => "[",
        0x30 => "]",
        0x31 => "\\",
        0x33 => ";",
        0x34 => "'",
        0x35 => "`",
        0x36 => ",",
        0x37 => ".",
        0x38 => "/",
        0xE0 => "LCTRL",
        0xE1 => "LSHIFT",
        0xE2 => "LALT",
        0xE3 => "LGUI",
        0xE4 => "RCTRL",
        0xE5 => "RSHIFT",
        0xE6 => "RALT",
        0xE7 => "RGUI",
        _ => return format!("KC_0x{code:04X}"),
    };
    name.to_string()
}

/// Space-separated modifier names, or `None`
pub fn modifier_label(bits: u8) -> String {
    let names: Vec<&str> = MODIFIER_NAMES
        .iter()
        .filter(|(bit, _)| bits & bit != 0)
        .map(|&(_, name)| name)
        .collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(" ")
    }
}

/// Where a raw position sits on the split layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPosition {
    pub position: u32,
    pub side: ActivitySide,
    pub row: u32,
    pub column: u32,
}

/// Row/column geometry of each half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    boundary: SplitBoundary,
    columns: u32,
}

impl KeyLayout {
    /// `columns` must be non-zero (checked by the config loader)
    pub fn new(boundary: SplitBoundary, columns: u32) -> Self {
        Self {
            boundary,
            columns: columns.max(1),
        }
    }

    pub fn locate(&self, position: u32) -> KeyPosition {
        let side = self.boundary.side_of(position);
        let offset = position - self.boundary.first_position(side);
        KeyPosition {
            position,
            side,
            row: offset / self.columns,
            column: offset % self.columns,
        }
    }
}

/// Rendered label text, top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfoLabels {
    pub position: String,
    pub keycode: String,
    pub layer: String,
    pub timing: String,
    pub modifiers: String,
}

impl KeyInfoLabels {
    pub fn lines(&self) -> [&str; 5] {
        [
            &self.position,
            &self.keycode,
            &self.layer,
            &self.timing,
            &self.modifiers,
        ]
    }
}

/// Last-key telemetry state
#[derive(Debug, Clone)]
pub struct KeyInfo {
    layout: KeyLayout,
    position: Option<KeyPosition>,
    pressed: bool,
    keycode: Option<u16>,
    layer: u8,
    modifiers: u8,
    press_time: Option<Instant>,
    release_time: Option<Instant>,
    hold: Duration,
}

impl KeyInfo {
    pub fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            position: None,
            pressed: false,
            keycode: None,
            layer: 0,
            modifiers: 0,
            press_time: None,
            release_time: None,
            hold: Duration::ZERO,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn position(&self) -> Option<KeyPosition> {
        self.position
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub fn on_position(&mut self, position: u32, pressed: bool, now: Instant) {
        self.position = Some(self.layout.locate(position));
        self.pressed = pressed;
        if pressed {
            self.press_time = Some(now);
            self.release_time = None;
            self.hold = Duration::ZERO;
        } else {
            self.release_time = Some(now);
            self.hold = self.held_until(now);
        }
    }

    /// Keycodes are only recorded on press; releases keep the last label
    pub fn on_keycode(&mut self, keycode: u16, pressed: bool) {
        if pressed {
            self.keycode = Some(keycode);
        }
    }

    /// Only newly activated layers are shown
    pub fn on_layer(&mut self, layer: u8, active: bool) {
        if active {
            self.layer = layer;
        }
    }

    pub fn on_modifiers(&mut self, bits: u8) {
        self.modifiers = bits;
    }

    /// Periodic refresh of the hold time while a key is down.
    /// Returns `true` if the timing label changed.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if !self.pressed {
            return false;
        }
        let hold = self.held_until(now);
        let changed = hold.as_millis() != self.hold.as_millis();
        self.hold = hold;
        changed
    }

    fn held_until(&self, now: Instant) -> Duration {
        self.press_time
            .and_then(|t| now.checked_duration_since(t))
            .unwrap_or(Duration::ZERO)
    }

    pub fn labels(&self) -> KeyInfoLabels {
        let position = match self.position {
            Some(p) => format!(
                "Pos: {},{},{} (#{})",
                p.row,
                p.column,
                p.side.index(),
                p.position
            ),
            None => "Pos: ---".to_string(),
        };

        let keycode = match (self.pressed, self.keycode) {
            (true, Some(code)) => format!("Key: {} (0x{:04X})", keycode_label(code), code),
            _ => "Key: ---".to_string(),
        };

        let timing = if self.pressed {
            format!("Hold: {} ms", self.hold.as_millis())
        } else if self.release_time.is_some() {
            format!("Last: {} ms", self.hold.as_millis())
        } else {
            "Time: ---".to_string()
        };

        KeyInfoLabels {
            position,
            keycode,
            layer: format!("Layer: {}", self.layer),
            timing,
            modifiers: format!("Mods: {}", modifier_label(self.modifiers)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corne() -> KeyLayout {
        KeyLayout::new(SplitBoundary::at(36).unwrap(), 6)
    }

    #[test]
    fn test_keycode_labels() {
        assert_eq!(keycode_label(0x04), "A");
        assert_eq!(keycode_label(0x1D), "Z");
        assert_eq!(keycode_label(0x1E), "1");
        assert_eq!(keycode_label(0x27), "0");
        assert_eq!(keycode_label(0x2A), "BKSP");
        assert_eq!(keycode_label(0x31), "\\");
        assert_eq!(keycode_label(0xE5), "RSHIFT");
        assert_eq!(keycode_label(0x3A), "KC_0x003A");
    }

    #[test]
    fn test_modifier_labels() {
        assert_eq!(modifier_label(0), "None");
        assert_eq!(modifier_label(mods::LSHIFT), "LSFT");
        assert_eq!(
            modifier_label(mods::RGUI | mods::LCTRL | mods::RALT),
            "LCTL RALT RGUI"
        );
    }

    #[test]
    fn test_layout_locates_both_halves() {
        let layout = corne();
        assert_eq!(
            layout.locate(13),
            KeyPosition {
                position: 13,
                side: ActivitySide::Left,
                row: 2,
                column: 1
            }
        );
        assert_eq!(
            layout.locate(43),
            KeyPosition {
                position: 43,
                side: ActivitySide::Right,
                row: 1,
                column: 1
            }
        );
    }

    #[test]
    fn test_initial_labels() {
        let info = KeyInfo::new(corne());
        let labels = info.labels();
        assert_eq!(
            labels.lines(),
            ["Pos: ---", "Key: ---", "Layer: 0", "Time: ---", "Mods: None"]
        );
    }

    #[test]
    fn test_press_hold_release() {
        let t0 = Instant::now();
        let mut info = KeyInfo::new(corne());
        info.on_position(40, true, t0);
        info.on_keycode(0x0B, true);
        info.on_modifiers(mods::LSHIFT);

        assert!(info.refresh(t0 + Duration::from_millis(120)));
        let labels = info.labels();
        assert_eq!(labels.position, "Pos: 0,4,1 (#40)");
        assert_eq!(labels.keycode, "Key: H (0x000B)");
        assert_eq!(labels.timing, "Hold: 120 ms");
        assert_eq!(labels.modifiers, "Mods: LSFT");

        info.on_keycode(0x0B, false);
        info.on_position(40, false, t0 + Duration::from_millis(180));
        assert!(!info.refresh(t0 + Duration::from_millis(500)));
        let labels = info.labels();
        assert_eq!(labels.keycode, "Key: ---");
        assert_eq!(labels.timing, "Last: 180 ms");
    }

    #[test]
    fn test_layer_ignores_deactivation() {
        let mut info = KeyInfo::new(corne());
        info.on_layer(2, true);
        info.on_layer(2, false);
        assert_eq!(info.labels().layer, "Layer: 2");
    }
}

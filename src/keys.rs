//! Key constants and the 32-bit wire encoding shared with the binding table.
use bitflags::bitflags;

/// Raw 32-bit key code: low 24 bits carry a Unicode scalar, a virtual key or
/// an asynchronous event; the top 4 bits carry modifier flags.
pub type KeyCode32 = u32;

/// Mask selecting the base (modifier-free) part of a raw code.
pub const KEY_MASK: KeyCode32 = 0x0FFF_FFFF;
/// First code of the virtual-key namespace.
pub const VIRT_BASE: KeyCode32 = 0x0100_0000;
/// First code of the event namespace.
pub const EVENT_BASE: KeyCode32 = 0x0200_0000;

bitflags! {
    /// Key modifiers, bit-exact with the raw encoding.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        /// Shift modifier
        const SHIFT = 0x1000_0000;
        /// Alt / Meta / Option modifier
        const ALT = 0x2000_0000;
        /// Control modifier
        const CTRL = 0x4000_0000;
        /// Control + Shift
        const CTRL_SHIFT = Self::CTRL.bits() | Self::SHIFT.bits();
        /// Alt + Shift
        const ALT_SHIFT = Self::ALT.bits() | Self::SHIFT.bits();
        /// Control + Alt
        const CTRL_ALT = Self::CTRL.bits() | Self::ALT.bits();
    }
}

impl Modifiers {
    /// No modifier
    pub const NONE: Self = Self::empty();
}

/// Non-printable keys with a dedicated escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualKey {
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Home key
    Home,
    /// End key
    End,
    /// Delete key (forward delete)
    Delete,
    /// Page-Up key
    PageUp,
    /// Page-Down key
    PageDown,
    /// Insert key
    Insert,
    /// Function key, 1-based (`F(1)` is F1)
    F(u8),
}

/// Asynchronous events delivered through the key stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The terminal was resized since the last read.
    Resize,
    /// Synthetic request to accept/extend the current completion.
    AutoTab,
    /// Asynchronous stop, behaves like Ctrl-C.
    Stop,
}

/// Base key, without modifiers.
///
/// ASCII control codes are kept in their compressed form: `Char('\x01')` is
/// `ctrl+a` with no [`Modifiers::CTRL`] bit set (legacy compression, see
/// [`KeyEvent::ctrl`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode scalar, including compressed control codes.
    Char(char),
    /// A virtual key.
    Virt(VirtualKey),
    /// An asynchronous event.
    Event(EventKind),
}

/// A decoded key press: base key plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent(pub KeyCode, pub Modifiers);

impl KeyEvent {
    /// Enter / Return (`\r`)
    pub const ENTER: Self = Self(KeyCode::Char('\r'), Modifiers::NONE);
    /// Escape
    pub const ESC: Self = Self(KeyCode::Char('\x1b'), Modifiers::NONE);
    /// Tab (`\t`)
    pub const TAB: Self = Self(KeyCode::Char('\t'), Modifiers::NONE);
    /// Backspace (`\x08`)
    pub const BACKSPACE: Self = Self(KeyCode::Char('\x08'), Modifiers::NONE);
    /// Linefeed (`\n`, Ctrl-J)
    pub const LINEFEED: Self = Self(KeyCode::Char('\n'), Modifiers::NONE);
    /// Rubout (`\x7f`), usually sent by the Backspace key
    pub const RUBOUT: Self = Self(KeyCode::Char('\x7f'), Modifiers::NONE);

    /// Plain character key.
    #[must_use]
    pub const fn from_char(c: char) -> Self {
        Self(KeyCode::Char(c), Modifiers::NONE)
    }

    /// Control chord. ASCII letters collapse to the compressed
    /// `CtrlA..CtrlZ` code points (no modifier bit); any other base keeps
    /// the generic [`Modifiers::CTRL`] bit.
    #[must_use]
    pub fn ctrl(c: char) -> Self {
        match c {
            'a'..='z' => Self(
                KeyCode::Char(char::from(c as u8 - b'a' + 1)),
                Modifiers::NONE,
            ),
            'A'..='Z' => Self(
                KeyCode::Char(char::from(c as u8 - b'A' + 1)),
                Modifiers::NONE,
            ),
            _ => Self(KeyCode::Char(c), Modifiers::CTRL),
        }
    }

    /// Alt chord.
    #[must_use]
    pub const fn alt(c: char) -> Self {
        Self(KeyCode::Char(c), Modifiers::ALT)
    }

    /// Virtual key without modifiers.
    #[must_use]
    pub const fn virt(vk: VirtualKey) -> Self {
        Self(KeyCode::Virt(vk), Modifiers::NONE)
    }

    /// Event pseudo-key.
    #[must_use]
    pub const fn event(ev: EventKind) -> Self {
        Self(KeyCode::Event(ev), Modifiers::NONE)
    }

    /// Is this one of the compressed `CtrlA..CtrlZ` codes (rendered with an
    /// implicit `ctrl+` prefix)? Backspace, tab, linefeed and enter render
    /// under their own names instead.
    #[must_use]
    pub fn is_implicit_ctrl(&self) -> bool {
        !self.1.contains(Modifiers::CTRL)
            && matches!(self.0, KeyCode::Char(c)
                if ('\x01'..='\x1a').contains(&c) && !matches!(c, '\x08' | '\t' | '\n' | '\r'))
    }

    /// Encode to the raw 32-bit form used by the binding table.
    #[must_use]
    pub fn to_code(self) -> KeyCode32 {
        let base = match self.0 {
            KeyCode::Char(c) => c as u32,
            KeyCode::Virt(vk) => {
                VIRT_BASE
                    + match vk {
                        VirtualKey::Up => 0,
                        VirtualKey::Down => 1,
                        VirtualKey::Left => 2,
                        VirtualKey::Right => 3,
                        VirtualKey::Home => 4,
                        VirtualKey::End => 5,
                        VirtualKey::Delete => 6,
                        VirtualKey::PageUp => 7,
                        VirtualKey::PageDown => 8,
                        VirtualKey::Insert => 9,
                        VirtualKey::F(n) => 10 + u32::from(n),
                    }
            }
            KeyCode::Event(ev) => {
                EVENT_BASE
                    + match ev {
                        EventKind::Resize => 1,
                        EventKind::AutoTab => 2,
                        EventKind::Stop => 3,
                    }
            }
        };
        base | self.1.bits()
    }

    /// Decode a raw 32-bit code. Unknown codes in a reserved namespace
    /// decode to the Unicode replacement character so they can be ignored
    /// downstream.
    #[must_use]
    pub fn from_code(code: KeyCode32) -> Self {
        let mods = Modifiers::from_bits_truncate(code & !KEY_MASK);
        let base = code & KEY_MASK;
        let key = if base >= EVENT_BASE {
            match base - EVENT_BASE {
                1 => KeyCode::Event(EventKind::Resize),
                2 => KeyCode::Event(EventKind::AutoTab),
                3 => KeyCode::Event(EventKind::Stop),
                _ => KeyCode::Char(char::REPLACEMENT_CHARACTER),
            }
        } else if base >= VIRT_BASE {
            match base - VIRT_BASE {
                0 => KeyCode::Virt(VirtualKey::Up),
                1 => KeyCode::Virt(VirtualKey::Down),
                2 => KeyCode::Virt(VirtualKey::Left),
                3 => KeyCode::Virt(VirtualKey::Right),
                4 => KeyCode::Virt(VirtualKey::Home),
                5 => KeyCode::Virt(VirtualKey::End),
                6 => KeyCode::Virt(VirtualKey::Delete),
                7 => KeyCode::Virt(VirtualKey::PageUp),
                8 => KeyCode::Virt(VirtualKey::PageDown),
                9 => KeyCode::Virt(VirtualKey::Insert),
                n @ 11..=34 => KeyCode::Virt(VirtualKey::F((n - 10) as u8)),
                _ => KeyCode::Char(char::REPLACEMENT_CHARACTER),
            }
        } else {
            KeyCode::Char(char::from_u32(base).unwrap_or(char::REPLACEMENT_CHARACTER))
        };
        Self(key, mods)
    }

    /// The event kind, if this is an event pseudo-key.
    #[must_use]
    pub fn as_event(&self) -> Option<EventKind> {
        if let KeyCode::Event(ev) = self.0 {
            Some(ev)
        } else {
            None
        }
    }

    /// The insertable character, if any: a non-control char with at most
    /// the Shift modifier.
    #[must_use]
    pub fn as_insert_char(&self) -> Option<char> {
        if self.1.intersects(Modifiers::CTRL | Modifiers::ALT) {
            return None;
        }
        match self.0 {
            KeyCode::Char(c) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, KeyCode, KeyEvent, Modifiers, VirtualKey, EVENT_BASE, VIRT_BASE};

    #[test]
    fn ctrl_compression() {
        assert_eq!(KeyEvent::ctrl('a'), KeyEvent::from_char('\x01'));
        assert_eq!(KeyEvent::ctrl('Z'), KeyEvent::from_char('\x1a'));
        assert_eq!(1, KeyEvent::ctrl('a').to_code());
        assert!(KeyEvent::ctrl('a').is_implicit_ctrl());
        // no compression outside the letters
        assert_eq!(
            KeyEvent(KeyCode::Char('_'), Modifiers::CTRL),
            KeyEvent::ctrl('_')
        );
        assert!(!KeyEvent::ctrl('_').is_implicit_ctrl());
    }

    #[test]
    fn modifier_bits() {
        let key = KeyEvent(KeyCode::Virt(VirtualKey::Left), Modifiers::CTRL);
        assert_eq!(0x4100_0002, key.to_code());
        let key = KeyEvent(KeyCode::Char('b'), Modifiers::ALT);
        assert_eq!(0x2000_0000 | u32::from('b'), key.to_code());
    }

    #[test]
    fn event_codes() {
        assert_eq!(
            EVENT_BASE + 3,
            KeyEvent::event(EventKind::Stop).to_code()
        );
        assert_eq!(VIRT_BASE + 11, KeyEvent::virt(VirtualKey::F(1)).to_code());
    }

    #[test]
    fn roundtrip() {
        for key in [
            KeyEvent::from_char('é'),
            KeyEvent::ctrl('w'),
            KeyEvent(KeyCode::Virt(VirtualKey::Home), Modifiers::SHIFT),
            KeyEvent(KeyCode::Virt(VirtualKey::F(12)), Modifiers::NONE),
            KeyEvent::event(EventKind::Resize),
            KeyEvent(KeyCode::Char('<'), Modifiers::ALT),
        ] {
            assert_eq!(key, KeyEvent::from_code(key.to_code()));
        }
    }
}

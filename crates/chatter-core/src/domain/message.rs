//! Button-transition message kinds and the observed-message set.
//!
//! The numeric values are the Win32 window message identifiers delivered as
//! `wParam` to a `WH_MOUSE_LL` hook procedure. They are duplicated here as
//! plain constants so this crate stays free of OS bindings.

use super::button::Button;
use super::thresholds::ThresholdTable;

/// Direction of a button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// A button-transition message understood by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    LeftDown,
    LeftUp,
    RightDown,
    RightUp,
    MiddleDown,
    MiddleUp,
    /// Down transition of either side button; the button is in the high word
    /// of the mouse-data field.
    ExtraDown,
    ExtraUp,
}

impl MessageKind {
    pub const WM_LBUTTONDOWN: u32 = 0x0201;
    pub const WM_LBUTTONUP: u32 = 0x0202;
    pub const WM_RBUTTONDOWN: u32 = 0x0204;
    pub const WM_RBUTTONUP: u32 = 0x0205;
    pub const WM_MBUTTONDOWN: u32 = 0x0207;
    pub const WM_MBUTTONUP: u32 = 0x0208;
    pub const WM_XBUTTONDOWN: u32 = 0x020B;
    pub const WM_XBUTTONUP: u32 = 0x020C;

    /// Maps a raw window message to a transition kind.
    ///
    /// Returns `None` for moves, wheel events and anything else that is not a
    /// button transition.
    #[inline]
    pub const fn from_raw(message: u32) -> Option<Self> {
        match message {
            Self::WM_LBUTTONDOWN => Some(MessageKind::LeftDown),
            Self::WM_LBUTTONUP => Some(MessageKind::LeftUp),
            Self::WM_RBUTTONDOWN => Some(MessageKind::RightDown),
            Self::WM_RBUTTONUP => Some(MessageKind::RightUp),
            Self::WM_MBUTTONDOWN => Some(MessageKind::MiddleDown),
            Self::WM_MBUTTONUP => Some(MessageKind::MiddleUp),
            Self::WM_XBUTTONDOWN => Some(MessageKind::ExtraDown),
            Self::WM_XBUTTONUP => Some(MessageKind::ExtraUp),
            _ => None,
        }
    }

    /// The raw window message for this kind.
    pub const fn raw(self) -> u32 {
        match self {
            MessageKind::LeftDown => Self::WM_LBUTTONDOWN,
            MessageKind::LeftUp => Self::WM_LBUTTONUP,
            MessageKind::RightDown => Self::WM_RBUTTONDOWN,
            MessageKind::RightUp => Self::WM_RBUTTONUP,
            MessageKind::MiddleDown => Self::WM_MBUTTONDOWN,
            MessageKind::MiddleUp => Self::WM_MBUTTONUP,
            MessageKind::ExtraDown => Self::WM_XBUTTONDOWN,
            MessageKind::ExtraUp => Self::WM_XBUTTONUP,
        }
    }

    #[inline]
    pub const fn direction(self) -> Direction {
        match self {
            MessageKind::LeftDown
            | MessageKind::RightDown
            | MessageKind::MiddleDown
            | MessageKind::ExtraDown => Direction::Down,
            _ => Direction::Up,
        }
    }

    /// The button this kind refers to, or `None` for the side-button kinds,
    /// which need the mouse-data word to disambiguate.
    #[inline]
    pub const fn fixed_button(self) -> Option<Button> {
        match self {
            MessageKind::LeftDown | MessageKind::LeftUp => Some(Button::Left),
            MessageKind::RightDown | MessageKind::RightUp => Some(Button::Right),
            MessageKind::MiddleDown | MessageKind::MiddleUp => Some(Button::Middle),
            MessageKind::ExtraDown | MessageKind::ExtraUp => None,
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Immutable set of message kinds worth evaluating.
///
/// Derived from a [`ThresholdTable`]: a button's down/up pair is present iff
/// its threshold is non-negative. Both side buttons share one message pair,
/// so that pair is present if either side-button threshold is non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObservedMessages(u8);

impl ObservedMessages {
    /// The empty set.
    pub const NONE: ObservedMessages = ObservedMessages(0);

    /// Derives the set from the thresholds in `table`.
    pub fn from_table(table: &ThresholdTable) -> Self {
        let mut set = Self::NONE;
        if table.threshold(Button::Left) >= 0 {
            set = set.with(MessageKind::LeftDown).with(MessageKind::LeftUp);
        }
        if table.threshold(Button::Right) >= 0 {
            set = set.with(MessageKind::RightDown).with(MessageKind::RightUp);
        }
        if table.threshold(Button::Middle) >= 0 {
            set = set.with(MessageKind::MiddleDown).with(MessageKind::MiddleUp);
        }
        if table.threshold(Button::Extra1) >= 0 || table.threshold(Button::Extra2) >= 0 {
            set = set.with(MessageKind::ExtraDown).with(MessageKind::ExtraUp);
        }
        set
    }

    #[must_use]
    pub const fn with(self, kind: MessageKind) -> Self {
        ObservedMessages(self.0 | kind.bit())
    }

    #[inline]
    pub const fn contains(self, kind: MessageKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

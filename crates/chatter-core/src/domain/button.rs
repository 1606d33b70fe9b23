//! Mouse button identity and dense per-button storage.
//!
//! A transition that cannot be attributed to a button is represented as
//! `Option::<Button>::None`, so "not applicable" can never be used as a key
//! into [`ButtonMap`].

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// A physical mouse button whose transitions can be filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Left,
    Right,
    Middle,
    /// First side button ("back" on most mice).
    Extra1,
    /// Second side button ("forward" on most mice).
    Extra2,
}

impl Button {
    /// Number of trackable buttons.
    pub const COUNT: usize = 5;

    /// All trackable buttons in ordinal order.
    pub const ALL: [Button; Button::COUNT] = [
        Button::Left,
        Button::Right,
        Button::Middle,
        Button::Extra1,
        Button::Extra2,
    ];

    /// Dense ordinal used to index [`ButtonMap`].
    pub const fn ordinal(self) -> usize {
        match self {
            Button::Left => 0,
            Button::Right => 1,
            Button::Middle => 2,
            Button::Extra1 => 3,
            Button::Extra2 => 4,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Middle => "middle",
            Button::Extra1 => "x1",
            Button::Extra2 => "x2",
        };
        f.write_str(name)
    }
}

/// Fixed-size map with exactly one entry per [`Button`].
///
/// Backed by an array indexed by [`Button::ordinal`], so every button always
/// has a value and lookups never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMap<T>([T; Button::COUNT]);

impl<T: Copy> ButtonMap<T> {
    /// Creates a map with every button set to `value`.
    pub const fn filled(value: T) -> Self {
        Self([value; Button::COUNT])
    }
}

impl<T> ButtonMap<T> {
    /// Creates a map from per-button values in ordinal order.
    pub const fn from_array(values: [T; Button::COUNT]) -> Self {
        Self(values)
    }

    /// Iterates over `(button, value)` pairs in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (Button, &T)> {
        Button::ALL.iter().copied().zip(self.0.iter())
    }
}

impl<T: Default + Copy> Default for ButtonMap<T> {
    fn default() -> Self {
        Self::filled(T::default())
    }
}

impl<T> Index<Button> for ButtonMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, button: Button) -> &T {
        &self.0[button.ordinal()]
    }
}

impl<T> IndexMut<Button> for ButtonMap<T> {
    #[inline]
    fn index_mut(&mut self, button: Button) -> &mut T {
        &mut self.0[button.ordinal()]
    }
}

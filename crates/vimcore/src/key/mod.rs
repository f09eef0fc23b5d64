//! Key inputs, key sequences and key notation.

mod input;
pub mod notation;
mod set;

pub use input::{KeyInput, KeyModifiers, VimKey};
pub use notation::{key_to_notation, keys_to_notation, parse_key, parse_keys};
pub use set::KeyInputSet;

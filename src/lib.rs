//! Pan/zoom/select viewport for point-of-interest maps, with a Braille-dot
//! drawing backend for terminals.

pub mod braille;
pub mod config;
pub mod data;
pub mod events;
pub mod map;

//! Typestate markers for the sections of a DNS message this crate reads and writes.
//!
//! Only the *Question* and *Answer* sections are needed to resolve a name; anything after the
//! *Answer* section is never looked at.

mod sealed {
    pub trait Sealed: 'static {}
}

/// Trait implemented by the DNS section types.
pub trait Section: sealed::Sealed {}

/// Represents the *Question* section of a DNS message.
pub enum Question {}

/// Represents the *Answer* section of a DNS message.
pub enum Answer {}

impl sealed::Sealed for Question {}
impl sealed::Sealed for Answer {}
impl Section for Question {}
impl Section for Answer {}

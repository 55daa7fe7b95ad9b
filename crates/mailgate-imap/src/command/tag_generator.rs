//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "A0000", "A0001", etc. The
/// session owns its generator exclusively, so no atomics are needed.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    ///
    /// The counter wraps after `u32::MAX`; tags only need to be unique among
    /// commands still awaiting completion, and there is only ever one.
    pub fn next_tag(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{:04}", self.prefix, n)
    }

    /// Returns the current counter value without incrementing.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.counter
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_generation() {
        let mut generator = TagGenerator::default();
        assert_eq!(generator.next_tag(), "A0000");
        assert_eq!(generator.next_tag(), "A0001");
        assert_eq!(generator.next_tag(), "A0002");
    }

    #[test]
    fn test_custom_prefix() {
        let mut generator = TagGenerator::new('T');
        assert_eq!(generator.next_tag(), "T0000");
        assert_eq!(generator.current(), 1);
    }

    #[test]
    fn test_padding() {
        let mut generator = TagGenerator::new('X');
        for _ in 0..100 {
            let _ = generator.next_tag();
        }
        assert_eq!(generator.next_tag(), "X0100");
    }

    #[test]
    fn test_wraps_instead_of_panicking() {
        let mut generator = TagGenerator::default();
        generator.counter = u32::MAX;
        assert_eq!(generator.next_tag(), format!("A{}", u32::MAX));
        assert_eq!(generator.next_tag(), "A0000");
    }
}

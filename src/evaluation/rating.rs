use super::MAX_RATING;

/// Five-star input: a committed value plus a hover preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StarRating {
    value: u8,
    hover: Option<u8>,
    read_only: bool,
}

impl StarRating {
    pub fn new(value: u8, read_only: bool) -> Self {
        Self {
            value: value.min(MAX_RATING),
            hover: None,
            read_only,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Commit a star. Returns the new value when it changed.
    pub fn click(&mut self, star: u8) -> Option<u8> {
        if self.read_only || star == 0 || star > MAX_RATING {
            return None;
        }
        self.value = star;
        Some(star)
    }

    pub fn hover(&mut self, star: u8) {
        if !self.read_only && (1..=MAX_RATING).contains(&star) {
            self.hover = Some(star);
        }
    }

    pub fn leave(&mut self) {
        if !self.read_only {
            self.hover = None;
        }
    }

    /// Star `n` (1-based) is highlighted under the preview, or the value when not hovering
    pub fn is_lit(&self, star: u8) -> bool {
        star >= 1 && star <= self.hover.unwrap_or(self.value)
    }

    pub fn render(&self) -> String {
        (1..=MAX_RATING)
            .map(|star| if self.is_lit(star) { '★' } else { '☆' })
            .collect()
    }
}

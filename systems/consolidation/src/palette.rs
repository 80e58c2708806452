//! Round-robin palette shared by collection markers and cell tints.

use log::error;
use rowmatch_core::{PaletteColor, PaletteIndex};

#[derive(Debug)]
pub(crate) struct Palette {
    colors: Vec<PaletteColor>,
    cursor: usize,
    reported_empty: bool,
}

impl Palette {
    pub(crate) fn new(colors: Vec<PaletteColor>) -> Self {
        Self {
            colors,
            cursor: 0,
            reported_empty: false,
        }
    }

    /// Hands out the next palette entry and advances the cursor, wrapping at
    /// the end of the palette.
    pub(crate) fn next(&mut self) -> Option<(PaletteIndex, PaletteColor)> {
        if self.colors.is_empty() {
            if !self.reported_empty {
                error!("marker palette is empty; markers and tints are disabled");
                self.reported_empty = true;
            }
            return None;
        }
        let index = self.cursor % self.colors.len();
        self.cursor = (index + 1) % self.colors.len();
        let palette = PaletteIndex::new(u32::try_from(index).unwrap_or(u32::MAX));
        Some((palette, self.colors[index]))
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_after_last_entry() {
        let mut palette = Palette::new(vec![
            PaletteColor::from_rgb(1, 0, 0),
            PaletteColor::from_rgb(0, 1, 0),
        ]);
        let indices: Vec<u32> = (0..5)
            .filter_map(|_| palette.next())
            .map(|(index, _)| index.get())
            .collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
        assert_eq!(palette.cursor(), 1);
    }

    #[test]
    fn empty_palette_yields_nothing() {
        let mut palette = Palette::new(Vec::new());
        assert!(palette.next().is_none());
        assert!(palette.next().is_none());
        assert_eq!(palette.cursor(), 0);
    }
}

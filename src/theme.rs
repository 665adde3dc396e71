//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of tile colours: 2, 4, 8 ... 2048. Larger values reuse the last one.
pub const TILE_COLORS: usize = 11;

/// Board and tile colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile fills by rank: index 0 is the 2 tile.
    pub tiles: [Color; TILE_COLORS],
    /// Canvas background.
    pub bg: Color,
    /// Grid lines and border.
    pub outline: Color,
    /// Tile numbers.
    pub text: Color,
    /// Titles / status bar.
    pub title: Color,
    pub status_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// The classic palette: cream through orange to gold on a terracotta board.
    pub fn classic() -> Self {
        Self {
            tiles: [
                Color::Rgb(237, 229, 218), // 2
                Color::Rgb(238, 225, 201), // 4
                Color::Rgb(243, 178, 122), // 8
                Color::Rgb(246, 150, 101), // 16
                Color::Rgb(247, 124, 95),  // 32
                Color::Rgb(247, 95, 59),   // 64
                Color::Rgb(237, 208, 115), // 128
                Color::Rgb(237, 204, 99),  // 256
                Color::Rgb(236, 202, 80),  // 512
                Color::Rgb(236, 196, 63),  // 1024
                Color::Rgb(236, 193, 45),  // 2048
            ],
            bg: Color::Rgb(205, 110, 101),
            outline: Color::Rgb(157, 155, 155),
            text: Color::Rgb(119, 110, 101),
            title: Color::Rgb(236, 193, 45),
            status_fg: Color::Rgb(238, 225, 201),
        }
    }

    /// Load a theme file. Keys are `tile_2` .. `tile_2048`, `bg`, `outline`,
    /// `text`, `title`, `status_fg`; anything missing keeps the classic colour.
    /// Falls back to the classic theme if `path` is None or missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (rank, slot) in theme.tiles.iter_mut().enumerate() {
            if let Some(c) = get(&format!("tile_{}", 2u32 << rank))? {
                *slot = c;
            }
        }
        for (key, slot) in [
            ("bg", &mut theme.bg),
            ("outline", &mut theme.outline),
            ("text", &mut theme.text),
            ("title", &mut theme.title),
            ("status_fg", &mut theme.status_fg),
        ] {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        Ok(theme)
    }

    /// Fill colour for a tile value. Panics on values a tile can never hold.
    pub fn tile_color(&self, value: u32) -> Color {
        assert!(
            crate::tile::is_valid_value(value),
            "no colour for tile value {value}"
        );
        self.rank_color(value.trailing_zeros())
    }

    /// Colour by log2 of the value. Ranks past the palette reuse the last colour.
    pub fn rank_color(&self, rank: u32) -> Color {
        self.tiles[(rank.max(1) as usize - 1).min(TILE_COLORS - 1)]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |hex: &str| {
        u8::from_str_radix(hex, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[tile_8]="#F3B27A""##);
        assert_eq!(map.get("tile_8"), Some(&"#F3B27A".to_string()));
    }

    #[test]
    fn test_tile_color_by_rank() {
        let theme = Theme::classic();
        assert_eq!(theme.tile_color(2), Color::Rgb(237, 229, 218));
        assert_eq!(theme.tile_color(512), Color::Rgb(236, 202, 80));
        assert_eq!(theme.tile_color(8192), theme.tile_color(2048));
    }

    #[test]
    #[should_panic(expected = "no colour")]
    fn test_tile_color_rejects_non_power_of_two() {
        let _ = Theme::classic().tile_color(24);
    }

    #[test]
    fn test_from_map_overrides_and_keeps_rest() {
        let map = parse_theme_file(
            "# comment\ntheme[tile_4]='#000000'\ntheme[bg]=\"#112233\"\ntheme[unknown]=\"#FFFFFF\"\n",
        );
        let theme = Theme::from_map(&map).unwrap();
        assert_eq!(theme.tile_color(4), Color::Rgb(0, 0, 0));
        assert_eq!(theme.bg, Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.tile_color(2), Theme::classic().tile_color(2));
    }

    #[test]
    fn test_from_map_reports_bad_colour() {
        let map = parse_theme_file("theme[outline]=\"#nothex\"");
        assert!(Theme::from_map(&map).is_err());
    }

    #[test]
    fn test_from_map_rejects_multibyte_colour() {
        assert!(matches!(parse_hex("#ab€a"), Err(ThemeError::InvalidHex(_))));
        let map = parse_theme_file("theme[tile_2]=\"#ab€a\"\ntheme[bg]=\"#€€\"");
        assert!(matches!(
            Theme::from_map(&map),
            Err(ThemeError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_load_without_path_is_classic() {
        let theme = Theme::load(None).unwrap();
        assert_eq!(theme.bg, Theme::classic().bg);
    }
}

// Colour attribute grammar: hex (RRGGBB / RRGGBBAA, optional '#') or a name

use super::error::SyntaxError;
use macroquad::color::{
    BLACK, BLANK, BLUE, BROWN, DARKGRAY, GOLD, GRAY, GREEN, LIGHTGRAY, MAGENTA, ORANGE, PINK,
    PURPLE, RED, SKYBLUE, WHITE, YELLOW,
};
use macroquad::prelude::Color;

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "white" => WHITE,
        "black" => BLACK,
        "red" => RED,
        "green" => GREEN,
        "blue" => BLUE,
        "yellow" => YELLOW,
        "orange" => ORANGE,
        "pink" => PINK,
        "purple" => PURPLE,
        "magenta" => MAGENTA,
        "brown" => BROWN,
        "gold" => GOLD,
        "gray" | "grey" => GRAY,
        "lightgray" => LIGHTGRAY,
        "darkgray" => DARKGRAY,
        "skyblue" => SKYBLUE,
        "clear" | "transparent" => BLANK,
        _ => return None,
    };
    Some(color)
}

pub fn parse_color(text: &str) -> Result<Color, SyntaxError> {
    let trimmed = text.trim();
    if let Some(color) = named_color(&trimmed.to_lowercase()) {
        return Ok(color);
    }
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SyntaxError::InvalidColor(text.to_string()));
    }
    let channel = |index: usize| -> Result<u8, SyntaxError> {
        u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16)
            .map_err(|_| SyntaxError::InvalidColor(text.to_string()))
    };
    let alpha = if hex.len() == 8 { channel(3)? } else { 255 };
    Ok(Color::from_rgba(channel(0)?, channel(1)?, channel(2)?, alpha))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_hex_colors() {
        let color = parse_color("#ff8000").unwrap();
        assert_approx_eq!(color.r, 1.0);
        assert_approx_eq!(color.g, 128.0 / 255.0);
        assert_approx_eq!(color.b, 0.0);
        assert_approx_eq!(color.a, 1.0);

        let translucent = parse_color("00000080").unwrap();
        assert_approx_eq!(translucent.a, 128.0 / 255.0);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("white").unwrap(), WHITE);
        assert_eq!(parse_color("Gold").unwrap(), GOLD);
    }

    #[test]
    fn test_invalid_colors() {
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("zzzzzz").is_err());
        assert!(parse_color("notacolor").is_err());
    }
}

// Dimension parser: plain numbers, "px" suffix, and "g" grid units

use super::error::SyntaxError;

/// Unit applied to a dimension that carries no explicit suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Pixel,
    Grid,
}

/// Parses dimensions such as `12`, `12px`, `2g` or `-0.5g`.
///
/// Grid values are multiplied by `grid_size`, which the builder updates
/// whenever it creates an anchor group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionParser {
    pub grid_size: f32,
}

impl Default for DimensionParser {
    fn default() -> Self {
        DimensionParser { grid_size: 1.0 }
    }
}

impl DimensionParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&self, text: &str) -> Result<f32, SyntaxError> {
        self.parse_with_unit(text, Unit::Pixel)
    }

    pub fn parse_with_unit(&self, text: &str, default_unit: Unit) -> Result<f32, SyntaxError> {
        let trimmed = text.trim();
        let (number, unit) = if let Some(number) = trimmed.strip_suffix("px") {
            (number, Unit::Pixel)
        } else if let Some(number) = trimmed.strip_suffix('g') {
            (number, Unit::Grid)
        } else {
            (trimmed, default_unit)
        };
        let value: f32 = number
            .parse()
            .map_err(|_| SyntaxError::InvalidDimension(text.to_string()))?;
        if !value.is_finite() {
            return Err(SyntaxError::InvalidDimension(text.to_string()));
        }
        Ok(match unit {
            Unit::Pixel => value,
            Unit::Grid => value * self.grid_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_plain_and_pixel_values() {
        let parser = DimensionParser::new();
        assert_approx_eq!(parser.parse("12").unwrap(), 12.0);
        assert_approx_eq!(parser.parse(" 12.5px ").unwrap(), 12.5);
        assert_approx_eq!(parser.parse("-3").unwrap(), -3.0);
    }

    #[test]
    fn test_grid_units() {
        let parser = DimensionParser { grid_size: 20.0 };
        assert_approx_eq!(parser.parse("2g").unwrap(), 40.0);
        assert_approx_eq!(parser.parse_with_unit("1.5", Unit::Grid).unwrap(), 30.0);
        assert_approx_eq!(parser.parse_with_unit("4px", Unit::Grid).unwrap(), 4.0);
    }

    #[test]
    fn test_malformed_values_fail() {
        let parser = DimensionParser::new();
        assert!(parser.parse("").is_err());
        assert!(parser.parse("abc").is_err());
        assert!(parser.parse("3gg").is_err());
        assert!(parser.parse("inf").is_err());
    }
}

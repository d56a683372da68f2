//! Fixed color catalog for the palette
//!
//! The catalog maps human-readable finish names to hex values. Order is
//! significant: number keys 1-9 select the first nine entries.

use crate::color::Rgb;

/// One named finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogColor {
    /// Catalog key, persisted as the variant's `color_key`
    pub name: &'static str,
    pub hex: &'static str,
}

impl CatalogColor {
    /// Catalog hex values are compile-time constants and always parse
    pub fn rgb(&self) -> Rgb {
        Rgb::from_hex(self.hex).unwrap_or(Rgb::new(0, 0, 0))
    }
}

pub const CATALOG: &[CatalogColor] = &[
    CatalogColor { name: "Evergreen", hex: "#2F5A3A" },
    CatalogColor { name: "Colonial Red", hex: "#8B1E1E" },
    CatalogColor { name: "Charcoal Gray", hex: "#36454F" },
    CatalogColor { name: "Gallery Blue", hex: "#1F3A5F" },
    CatalogColor { name: "Burnished Slate", hex: "#4A4238" },
    CatalogColor { name: "Matte Black", hex: "#1C1C1C" },
    CatalogColor { name: "Bright White", hex: "#F4F4F0" },
    CatalogColor { name: "Desert Sand", hex: "#C2B280" },
    CatalogColor { name: "Copper Penny", hex: "#AD6F3B" },
    CatalogColor { name: "Forest Green", hex: "#228B22" },
    CatalogColor { name: "Hunter Green", hex: "#355E3B" },
    CatalogColor { name: "Barn Red", hex: "#7C0A02" },
    CatalogColor { name: "Brick Red", hex: "#9C4A3A" },
    CatalogColor { name: "Rustic Red", hex: "#6E2C23" },
    CatalogColor { name: "Ocean Blue", hex: "#2E5E8C" },
    CatalogColor { name: "Hawaiian Blue", hex: "#3C7DA6" },
    CatalogColor { name: "Ash Gray", hex: "#8C8C88" },
    CatalogColor { name: "Light Stone", hex: "#D6CFC0" },
    CatalogColor { name: "Saddle Tan", hex: "#8A6A48" },
    CatalogColor { name: "Cocoa Brown", hex: "#5B4034" },
    CatalogColor { name: "Dark Bronze", hex: "#3F3A33" },
    CatalogColor { name: "Medium Bronze", hex: "#5C4B3A" },
    CatalogColor { name: "Galvalume", hex: "#B8BBB6" },
    CatalogColor { name: "Polar White", hex: "#ECEDE8" },
    CatalogColor { name: "Ivory", hex: "#EDE3C8" },
    CatalogColor { name: "Sage Green", hex: "#8A9A7B" },
    CatalogColor { name: "Patina Green", hex: "#5E8C7A" },
    CatalogColor { name: "Aged Copper", hex: "#6F8F7F" },
    CatalogColor { name: "Terra Cotta", hex: "#B5562D" },
    CatalogColor { name: "Regal Blue", hex: "#24385B" },
];

/// Look up a catalog entry by name (case-insensitive)
pub fn find(name: &str) -> Option<&'static CatalogColor> {
    CATALOG.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Map a number key (`1`..=`9`) to a catalog entry in declared order
pub fn shortcut(key: char) -> Option<&'static CatalogColor> {
    let index = key.to_digit(10)?;
    if index == 0 {
        return None;
    }
    CATALOG.get(index as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_hex_values_parse() {
        assert!(CATALOG.len() >= 25);
        for color in CATALOG {
            assert!(Rgb::from_hex(color.hex).is_ok(), "{} has bad hex", color.name);
        }
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert!(!a.name.eq_ignore_ascii_case(b.name));
            }
        }
    }

    #[test]
    fn test_shortcuts_follow_declared_order() {
        assert_eq!(shortcut('1').unwrap().name, "Evergreen");
        assert_eq!(shortcut('9').unwrap().name, CATALOG[8].name);
        assert!(shortcut('0').is_none());
        assert!(shortcut('x').is_none());
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find("evergreen").unwrap().hex, "#2F5A3A");
        assert!(find("Plaid").is_none());
    }
}

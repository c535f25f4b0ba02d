//! Six-digit hex color tags used in colored frame rows.

/// Encode an RGB triple as six lowercase hex digits (no `#`).
///
/// ```rust
/// use rune_ascii_core::color::hex_tag;
///
/// assert_eq!(hex_tag(250, 250, 250), "fafafa");
/// assert_eq!(hex_tag(1, 2, 255), "0102ff");
/// ```
pub fn hex_tag(r: u8, g: u8, b: u8) -> String {
    format!("{r:02x}{g:02x}{b:02x}")
}

/// Parse a color tag back into an RGB triple.
///
/// Accepts six hex digits with or without a leading `#`, case-insensitive.
/// An empty tag (a blank cell) yields `None`.
pub fn parse_tag(tag: &str) -> Option<(u8, u8, u8)> {
    let hex = tag.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// CSS color value for a tag, or `None` for the default (uncolored) tag.
///
/// Malformed tags also read as the default color, so nothing but a
/// normalized `#rrggbb` ever reaches a style.
pub fn css_color(tag: &str) -> Option<String> {
    let (r, g, b) = parse_tag(tag)?;
    Some(format!("#{}", hex_tag(r, g, b)))
}

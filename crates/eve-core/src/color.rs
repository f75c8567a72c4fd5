//! Colour handling: RGB triples, the CSS colour-name table, and the ROOT
//! colour-index palette.
//!
//! Two lookups live here:
//! - [`parse_color`] turns a palette selection (`"rgb(r, g, b)"`, a CSS
//!   colour name, or a `#hex` literal) into an [`Rgb`] triple.
//! - [`ColorIndex`] maps the numeric colour index stored on backend elements
//!   (`fMainColor`, `fLineColor`, ...) to a CSS colour string for display.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components as an array, in `r, g, b` order.
    pub fn components(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

static RGB_TUPLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"rgb\((\d+),\s?(\d+),\s?(\d+)\)").expect("rgb tuple regex is valid")
});

static HEX_SHORTHAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#?([a-f\d])([a-f\d])([a-f\d])$").expect("hex shorthand regex is valid")
});

static HEX_FULL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#?([a-f\d]{2})([a-f\d]{2})([a-f\d]{2})$").expect("hex regex is valid")
});

/// Parse a colour picked from the palette.
///
/// Tries an `rgb(r,g,b)` literal first, then a `#`-prefixed hex literal, then
/// the CSS colour-name table (case-sensitive). Returns `None` when nothing
/// matches or a component is out of range; callers must not dispatch in that
/// case.
pub fn parse_color(value: &str) -> Option<Rgb> {
    if let Some(caps) = RGB_TUPLE_REGEX.captures(value) {
        let r = caps[1].parse::<u8>().ok()?;
        let g = caps[2].parse::<u8>().ok()?;
        let b = caps[3].parse::<u8>().ok()?;
        return Some(Rgb::new(r, g, b));
    }

    if value.starts_with('#') {
        return parse_hex(value);
    }

    let hex = named_color_hex(value)?;
    parse_hex(hex)
}

/// Parse a 3- or 6-digit hex colour, with or without a leading `#`.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let expanded = HEX_SHORTHAND_REGEX.replace(hex, "$1$1$2$2$3$3");
    let caps = HEX_FULL_REGEX.captures(&expanded)?;
    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
    Some(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
}

/// Look up the hex value (lower-case, no `#`) of a CSS colour name.
pub fn named_color_hex(name: &str) -> Option<&'static str> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, hex)| *hex)
}

/// CSS colour names offered by the palette popover.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "f0f8ff"),
    ("antiquewhite", "faebd7"),
    ("aqua", "00ffff"),
    ("aquamarine", "7fffd4"),
    ("azure", "f0ffff"),
    ("beige", "f5f5dc"),
    ("bisque", "ffe4c4"),
    ("black", "000000"),
    ("blanchedalmond", "ffebcd"),
    ("blue", "0000ff"),
    ("blueviolet", "8a2be2"),
    ("brown", "a52a2a"),
    ("burlywood", "deb887"),
    ("cadetblue", "5f9ea0"),
    ("chartreuse", "7fff00"),
    ("chocolate", "d2691e"),
    ("coral", "ff7f50"),
    ("cornflowerblue", "6495ed"),
    ("cornsilk", "fff8dc"),
    ("crimson", "dc143c"),
    ("cyan", "00ffff"),
    ("darkblue", "00008b"),
    ("darkcyan", "008b8b"),
    ("darkgoldenrod", "b8860b"),
    ("darkgray", "a9a9a9"),
    ("darkgrey", "a9a9a9"),
    ("darkgreen", "006400"),
    ("darkkhaki", "bdb76b"),
    ("darkmagenta", "8b008b"),
    ("darkolivegreen", "556b2f"),
    ("darkorange", "ff8c00"),
    ("darkorchid", "9932cc"),
    ("darkred", "8b0000"),
    ("darksalmon", "e9967a"),
    ("darkseagreen", "8fbc8f"),
    ("darkslateblue", "483d8b"),
    ("darkslategray", "2f4f4f"),
    ("darkslategrey", "2f4f4f"),
    ("darkturquoise", "00ced1"),
    ("darkviolet", "9400d3"),
    ("deeppink", "ff1493"),
    ("deepskyblue", "00bfff"),
    ("dimgray", "696969"),
    ("dimgrey", "696969"),
    ("dodgerblue", "1e90ff"),
    ("firebrick", "b22222"),
    ("floralwhite", "fffaf0"),
    ("forestgreen", "228b22"),
    ("fuchsia", "ff00ff"),
    ("gainsboro", "dcdcdc"),
    ("ghostwhite", "f8f8ff"),
    ("gold", "ffd700"),
    ("goldenrod", "daa520"),
    ("gray", "808080"),
    ("grey", "808080"),
    ("green", "008000"),
    ("greenyellow", "adff2f"),
    ("honeydew", "f0fff0"),
    ("hotpink", "ff69b4"),
    ("indianred", "cd5c5c"),
    ("indigo", "4b0082"),
    ("ivory", "fffff0"),
    ("khaki", "f0e68c"),
    ("lavender", "e6e6fa"),
    ("lavenderblush", "fff0f5"),
    ("lawngreen", "7cfc00"),
    ("lemonchiffon", "fffacd"),
    ("lightblue", "add8e6"),
    ("lightcoral", "f08080"),
    ("lightcyan", "e0ffff"),
    ("lightgoldenrodyellow", "fafad2"),
    ("lightgray", "d3d3d3"),
    ("lightgrey", "d3d3d3"),
    ("lightgreen", "90ee90"),
    ("lightpink", "ffb6c1"),
    ("lightsalmon", "ffa07a"),
    ("lightseagreen", "20b2aa"),
    ("lightskyblue", "87cefa"),
    ("lightslategray", "778899"),
    ("lightslategrey", "778899"),
    ("lightsteelblue", "b0c4de"),
    ("lightyellow", "ffffe0"),
    ("lime", "00ff00"),
    ("limegreen", "32cd32"),
    ("linen", "faf0e6"),
    ("magenta", "ff00ff"),
    ("maroon", "800000"),
    ("mediumaquamarine", "66cdaa"),
    ("mediumblue", "0000cd"),
    ("mediumorchid", "ba55d3"),
    ("mediumpurple", "9370db"),
    ("mediumseagreen", "3cb371"),
    ("mediumslateblue", "7b68ee"),
    ("mediumspringgreen", "00fa9a"),
    ("mediumturquoise", "48d1cc"),
    ("mediumvioletred", "c71585"),
    ("midnightblue", "191970"),
    ("mintcream", "f5fffa"),
    ("mistyrose", "ffe4e1"),
    ("moccasin", "ffe4b5"),
    ("navajowhite", "ffdead"),
    ("navy", "000080"),
    ("oldlace", "fdf5e6"),
    ("olive", "808000"),
    ("olivedrab", "6b8e23"),
    ("orange", "ffa500"),
    ("orangered", "ff4500"),
    ("orchid", "da70d6"),
    ("palegoldenrod", "eee8aa"),
    ("palegreen", "98fb98"),
    ("paleturquoise", "afeeee"),
    ("palevioletred", "db7093"),
    ("papayawhip", "ffefd5"),
    ("peachpuff", "ffdab9"),
    ("peru", "cd853f"),
    ("pink", "ffc0cb"),
    ("plum", "dda0dd"),
    ("powderblue", "b0e0e6"),
    ("purple", "800080"),
    ("red", "ff0000"),
    ("rosybrown", "bc8f8f"),
    ("royalblue", "4169e1"),
    ("saddlebrown", "8b4513"),
    ("salmon", "fa8072"),
    ("sandybrown", "f4a460"),
    ("seagreen", "2e8b57"),
    ("seashell", "fff5ee"),
    ("sienna", "a0522d"),
    ("silver", "c0c0c0"),
    ("skyblue", "87ceeb"),
    ("slateblue", "6a5acd"),
    ("slategray", "708090"),
    ("slategrey", "708090"),
    ("snow", "fffafa"),
    ("springgreen", "00ff7f"),
    ("steelblue", "4682b4"),
    ("tan", "d2b48c"),
    ("teal", "008080"),
    ("thistle", "d8bfd8"),
    ("tomato", "ff6347"),
    ("turquoise", "40e0d0"),
    ("violet", "ee82ee"),
    ("wheat", "f5deb3"),
    ("white", "ffffff"),
    ("whitesmoke", "f5f5f5"),
    ("yellow", "ffff00"),
    ("yellowgreen", "9acd32"),
    ("transparent", "00000000"),
];

/// The first entries of the ROOT colour table, indexed by colour number.
const BASIC_ROOT_COLORS: &[&str] = &[
    "white",
    "black",
    "red",
    "green",
    "blue",
    "yellow",
    "magenta",
    "cyan",
    "rgb(89,212,84)",
    "rgb(89,84,217)",
    "white",
];

/// Runs of consecutive colour indices, packed as 6-digit hex triples.
///
/// 11..100 are the fixed greys and the default palette, 201..228 the dark
/// and light variants, then the `kYellow`, `kGreen`, `kCyan`, `kBlue`,
/// `kMagenta` and `kRed` ranges, the colour wheel from `kOrange - 9` to
/// `kPink + 10`, and the `kGray` shades.
const PACKED_ROOT_COLORS: &[(u32, &str)] = &[
    (
        11,
        "c1b7ad4d4d4d6666668080809a9a9ab3b3b3cccccce6e6e6f3f3f3cdc8accdc8acc3c0a9bbb6a4b3a697b8a49cae9a8d9c8f83886657b1cfc885c3a48aa9a1839f8daebdc87b8f9a768a926983976e7b857d9ad280809caca6c0d4cf88dfbb88bd9f83c89a7dc08378cf5f61ac8f94a6787b946971d45a549300ff7b00ff6300ff4b00ff3300ff1b00ff0300ff0014ff002cff0044ff005cff0074ff008cff00a4ff00bcff00d4ff00ecff00fffd00ffe500ffcd00ffb500ff9d00ff8500ff6d00ff5500ff3d00ff2600ff0e0aff0022ff003aff0052ff006aff0082ff009aff00b1ff00c9ff00e1ff00f9ff00ffef00ffd700ffbf00ffa700ff8f00ff7700ff6000ff4800ff3000ff1800ff0000",
    ),
    (
        201,
        "5c5c5c7b7b7bb8b8b8d7d7d78a0f0fb81414ec4848f176760f8a0f14b81448ec4876f1760f0f8a1414b84848ec7676f18a8a0fb8b814ecec48f1f1768a0f8ab814b8ec48ecf176f10f8a8a14b8b848ecec76f1f1",
    ),
    (390, "ffffcdffff9acdcd9affff66cdcd669a9a66ffff33cdcd339a9a33666633ffff00cdcd009a9a00666600333300"),
    (406, "cdffcd9aff9a9acd9a66ff6666cd66669a6633ff3333cd33339a3333663300ff0000cd00009a00006600003300"),
    (422, "cdffff9affff9acdcd66ffff66cdcd669a9a33ffff33cdcd339a9a33666600ffff00cdcd009a9a006666003333"),
    (590, "cdcdff9a9aff9a9acd6666ff6666cd66669a3333ff3333cd33339a3333660000ff0000cd00009a000066000033"),
    (606, "ffcdffff9affcd9acdff66ffcd66cd9a669aff33ffcd33cd9a339a663366ff00ffcd00cd9a009a660066330033"),
    (622, "ffcdcdff9a9acd9a9aff6666cd66669a6666ff3333cd33339a3333663333ff0000cd00009a0000660000330000"),
    (
        791,
        "ffcd9acd9a669a66339a6600cd9a33ffcd66ff9a00ffcd33cd9a00ffcd00ff9a33cd66006633009a3300cd6633ff9a66ff6600ff6633cd3300ff33009aff3366cd00336600339a0066cd339aff6666ff0066ff3333cd0033ff00cdff9a9acd66669a33669a009acd33cdff669aff00cdff339acd00cdff009affcd66cd9a339a66009a6633cd9a66ffcd00ff9a33ffcd00cd9a00ffcd33ff9a00cd66006633009a3333cd6666ff9a00ff6633ff6600cd3300ff33339aff0066cd00336600339a3366cd669aff0066ff3366ff0033cd0033ff9acdff669acd33669a00669a339acd66cdff009aff33cdff009acd00cdffcd9aff9a66cd66339a66009a9a33cdcd66ff9a00ffcd33ff9a00cdcd00ff9a33ff6600cd33006633009a6633cd9a66ff6600ff6633ff3300cd3300ffff339acd00666600339a0033cd3366ff669aff0066ff3366cd0033ff0033ff9acdcd669a9a33669a0066cd339aff66cdff009aff33cdcd009aff00cd",
    ),
    (920, "cdcdcd9a9a9a666666333333"),
];

/// The full ROOT colour table, built once from the basic and packed runs.
static ROOT_COLORS: LazyLock<BTreeMap<u32, String>> = LazyLock::new(|| {
    let mut table: BTreeMap<u32, String> = BASIC_ROOT_COLORS
        .iter()
        .zip(0u32..)
        .map(|(color, index)| (index, color.to_string()))
        .collect();
    table.insert(110, "white".to_string());

    for (first, packed) in PACKED_ROOT_COLORS {
        for (index, chunk) in (*first..).zip(packed.as_bytes().chunks_exact(6)) {
            let rgb = std::str::from_utf8(chunk).ok().and_then(parse_hex);
            if let Some(rgb) = rgb {
                table.insert(index, format!("rgb({},{},{})", rgb.r, rgb.g, rgb.b));
            }
        }
    }
    table
});

/// Maps backend colour indices to CSS colour strings.
///
/// Starts from the ROOT colour table; additional indices (user palettes,
/// `TColor` allocations) are supplied as overrides, typically from the
/// `[colors]` table of the settings file.
#[derive(Debug, Clone, Default)]
pub struct ColorIndex {
    overrides: BTreeMap<u32, String>,
}

impl ColorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the colour for an index.
    pub fn insert(&mut self, index: u32, color: impl Into<String>) {
        self.overrides.insert(index, color.into());
    }

    /// CSS colour for `index`, or `None` for an unknown index.
    pub fn lookup(&self, index: u32) -> Option<&str> {
        self.overrides
            .get(&index)
            .or_else(|| ROOT_COLORS.get(&index))
            .map(String::as_str)
    }
}

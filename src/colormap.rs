//! Named continuous colormaps and the fixed lookup tables sampled from them.
//!
//! The registry carries the matplotlib colormaps most used for table
//! shading. Each one is a set of per-channel breakpoints; sampling at `N`
//! evenly spaced points and linearly interpolating between breakpoints gives
//! the same lookup table matplotlib builds for a `LinearSegmentedColormap`.

use crate::error::{Result, TableError};

/// Colormap applied when none is named.
pub const DEFAULT_COLORMAP: &str = "RdBu";

/// Default number of entries in a lookup table.
pub const DEFAULT_SAMPLES: usize = 256;

/// Suffix selecting the reversed variant of a registered colormap.
const REVERSED_SUFFIX: &str = "_r";

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Composite this color over an opaque `base` and return the visible RGB.
    pub fn blend_over(self, base: (u8, u8, u8)) -> (u8, u8, u8) {
        let alpha = self.a as u16;
        let mix = |fg: u8, bg: u8| -> u8 {
            ((fg as u16 * alpha + bg as u16 * (255 - alpha) + 127) / 255) as u8
        };
        (mix(self.r, base.0), mix(self.g, base.1), mix(self.b, base.2))
    }
}

/// Convert a color channel in `[0, 1]` to an 8-bit integer.
///
/// Values at or above 1.0 become 255, values at or below 0.0 become 0, and
/// everything between is `floor(x * 256)`.
pub fn channel_to_u8(x: f64) -> u8 {
    if x >= 1.0 {
        255
    } else if x <= 0.0 {
        0
    } else {
        (x * 256.0).floor() as u8
    }
}

/// Breakpoints as `(position, value)` pairs, positions ascending in `[0, 1]`.
type Segments = &'static [(f64, f64)];

#[derive(Debug, Clone, Copy)]
enum Source {
    /// Evenly spaced colors written as 0xRRGGBB.
    Hex(&'static [u32]),
    /// Evenly spaced colors with float channels.
    Listed(&'static [[f64; 3]]),
    /// Independent breakpoints per channel.
    Segmented {
        red: Segments,
        green: Segments,
        blue: Segments,
    },
}

struct Entry {
    name: &'static str,
    source: Source,
}

// ColorBrewer schemes as shipped by matplotlib.
const RDBU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];
const RDYLBU: &[u32] = &[
    0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee090, 0xffffbf, 0xe0f3f8, 0xabd9e9, 0x74add1,
    0x4575b4, 0x313695,
];
const RDYLGN: &[u32] = &[
    0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63,
    0x1a9850, 0x006837,
];
const SPECTRAL: &[u32] = &[
    0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5,
    0x3288bd, 0x5e4fa2,
];
const PIYG: &[u32] = &[
    0x8e0152, 0xc51b7d, 0xde77ae, 0xf1b6da, 0xfde0ef, 0xf7f7f7, 0xe6f5d0, 0xb8e186, 0x7fbc41,
    0x4d9221, 0x276419,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const GREENS: &[u32] = &[
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const REDS: &[u32] = &[
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const ORANGES: &[u32] = &[
    0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
];
const PURPLES: &[u32] = &[
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
];
const GREYS: &[u32] = &[
    0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
];
const YLORRD: &[u32] = &[
    0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026,
];
const BWR: &[u32] = &[0x0000ff, 0xffffff, 0xff0000];
const SEISMIC: &[[f64; 3]] = &[
    [0.0, 0.0, 0.3],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.5, 0.0, 0.0],
];

const RAMP: Segments = &[(0.0, 0.0), (1.0, 1.0)];

static REGISTRY: &[Entry] = &[
    Entry {
        name: "RdBu",
        source: Source::Hex(RDBU),
    },
    Entry {
        name: "RdYlBu",
        source: Source::Hex(RDYLBU),
    },
    Entry {
        name: "RdYlGn",
        source: Source::Hex(RDYLGN),
    },
    Entry {
        name: "Spectral",
        source: Source::Hex(SPECTRAL),
    },
    Entry {
        name: "PiYG",
        source: Source::Hex(PIYG),
    },
    Entry {
        name: "bwr",
        source: Source::Hex(BWR),
    },
    Entry {
        name: "seismic",
        source: Source::Listed(SEISMIC),
    },
    Entry {
        name: "Blues",
        source: Source::Hex(BLUES),
    },
    Entry {
        name: "Greens",
        source: Source::Hex(GREENS),
    },
    Entry {
        name: "Reds",
        source: Source::Hex(REDS),
    },
    Entry {
        name: "Oranges",
        source: Source::Hex(ORANGES),
    },
    Entry {
        name: "Purples",
        source: Source::Hex(PURPLES),
    },
    Entry {
        name: "Greys",
        source: Source::Hex(GREYS),
    },
    Entry {
        name: "YlOrRd",
        source: Source::Hex(YLORRD),
    },
    Entry {
        name: "gray",
        source: Source::Segmented {
            red: RAMP,
            green: RAMP,
            blue: RAMP,
        },
    },
    Entry {
        name: "hot",
        source: Source::Segmented {
            red: &[(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)],
            green: &[(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)],
            blue: &[(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)],
        },
    },
    Entry {
        name: "jet",
        source: Source::Segmented {
            red: &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
            green: &[(0.0, 0.0), (0.125, 0.0), (0.375, 1.0), (0.64, 1.0), (0.91, 0.0), (1.0, 0.0)],
            blue: &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
        },
    },
];

/// A named continuous colormap from the registry.
#[derive(Debug, Clone, Copy)]
pub struct ContinuousColormap {
    name: &'static str,
    source: Source,
    reversed: bool,
}

impl ContinuousColormap {
    /// Look a colormap up by name. A trailing `_r` selects the reversed map.
    pub fn lookup(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix(REVERSED_SUFFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        REGISTRY
            .iter()
            .find(|entry| entry.name == base)
            .map(|entry| Self {
                name: entry.name,
                source: entry.source,
                reversed,
            })
            .ok_or_else(|| TableError::UnknownColormap {
                name: name.to_string(),
                available: names().join(", "),
            })
    }

    /// Registered base name (without any `_r` suffix).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// RGB channels in `[0, 1]` at position `x` in `[0, 1]`.
    pub fn sample(&self, x: f64) -> [f64; 3] {
        let x = x.clamp(0.0, 1.0);
        let x = if self.reversed { 1.0 - x } else { x };
        match self.source {
            Source::Hex(colors) => interpolate_listed(colors.len(), x, |i| {
                let c = colors[i];
                [
                    ((c >> 16) & 0xff) as f64 / 255.0,
                    ((c >> 8) & 0xff) as f64 / 255.0,
                    (c & 0xff) as f64 / 255.0,
                ]
            }),
            Source::Listed(colors) => interpolate_listed(colors.len(), x, |i| colors[i]),
            Source::Segmented { red, green, blue } => [
                interpolate_segments(red, x),
                interpolate_segments(green, x),
                interpolate_segments(blue, x),
            ],
        }
    }
}

/// Every registered base name, in registry order.
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|entry| entry.name).collect()
}

/// Whether `name` (optionally `_r`-suffixed) is registered.
pub fn is_known(name: &str) -> bool {
    ContinuousColormap::lookup(name).is_ok()
}

fn interpolate_listed(len: usize, x: f64, color: impl Fn(usize) -> [f64; 3]) -> [f64; 3] {
    if len == 1 {
        return color(0);
    }
    let pos = x * (len - 1) as f64;
    let lower = (pos.floor() as usize).min(len - 2);
    let t = pos - lower as f64;
    let (a, b) = (color(lower), color(lower + 1));
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn interpolate_segments(points: Segments, x: f64) -> f64 {
    let upper = points
        .iter()
        .position(|&(px, _)| px >= x)
        .unwrap_or(points.len() - 1);
    if upper == 0 {
        return points[0].1;
    }
    let (x0, y0) = points[upper - 1];
    let (x1, y1) = points[upper];
    if x1 == x0 {
        return y1;
    }
    (y0 + (x - x0) / (x1 - x0) * (y1 - y0)).clamp(0.0, 1.0)
}

/// Fixed lookup table sampled from a continuous colormap.
///
/// Entry 0 is the sample taken at the high end of the colormap: the sampled
/// sequence is reversed before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ColormapTable {
    name: String,
    entries: Vec<Rgba>,
}

impl ColormapTable {
    /// Sample `name` at `samples` evenly spaced points.
    ///
    /// With `alpha` set, every entry's alpha channel is overwritten with it;
    /// otherwise entries are opaque.
    pub fn build(name: &str, samples: usize, alpha: Option<u8>) -> Result<Self> {
        if samples == 0 {
            return Err(TableError::InvalidOptions {
                message: format!("colormap '{name}' needs at least one sample"),
            });
        }
        let cmap = ContinuousColormap::lookup(name)?;

        let mut entries: Vec<Rgba> = (0..samples)
            .map(|i| {
                let x = if samples > 1 {
                    i as f64 / (samples - 1) as f64
                } else {
                    0.0
                };
                let [r, g, b] = cmap.sample(x);
                Rgba::new(channel_to_u8(r), channel_to_u8(g), channel_to_u8(b), 255)
            })
            .collect();
        entries.reverse();

        if let Some(alpha) = alpha {
            for entry in &mut entries {
                entry.a = alpha;
            }
        }

        Ok(Self {
            name: name.to_string(),
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest valid index.
    pub fn max_index(&self) -> usize {
        self.entries.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<Rgba> {
        self.entries.get(index).copied()
    }

    pub fn entries(&self) -> &[Rgba] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_conversion() {
        assert_eq!(channel_to_u8(1.0), 255);
        assert_eq!(channel_to_u8(1.5), 255);
        assert_eq!(channel_to_u8(0.0), 0);
        assert_eq!(channel_to_u8(-0.2), 0);
        assert_eq!(channel_to_u8(0.5), 128);
        assert_eq!(channel_to_u8(0.999), 255);
    }

    #[test]
    fn test_rdbu_table_is_reversed() {
        let table = ColormapTable::build("RdBu", 256, None).unwrap();
        assert_eq!(table.len(), 256);
        // high end of RdBu is #053061, low end #67001f
        assert_eq!(table.get(0), Some(Rgba::new(5, 48, 97, 255)));
        assert_eq!(table.get(255), Some(Rgba::new(103, 0, 31, 255)));
    }

    #[test]
    fn test_alpha_override() {
        let table = ColormapTable::build("jet", 16, Some(128)).unwrap();
        assert!(table.entries().iter().all(|c| c.a == 128));
    }

    #[test]
    fn test_reversed_suffix() {
        let forward = ColormapTable::build("Blues", 32, None).unwrap();
        let reversed = ColormapTable::build("Blues_r", 32, None).unwrap();
        assert_eq!(reversed.get(0), forward.get(31));
        assert_eq!(reversed.get(31), forward.get(0));
        assert_ne!(reversed.get(0), forward.get(0));
    }

    #[test]
    fn test_unknown_colormap() {
        let err = ColormapTable::build("NoSuchMap", 256, None).unwrap_err();
        assert!(matches!(err, TableError::UnknownColormap { .. }));
        assert!(err.to_string().contains("RdBu"));
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(ColormapTable::build("RdBu", 0, None).is_err());
    }

    #[test]
    fn test_jet_endpoints() {
        let jet = ContinuousColormap::lookup("jet").unwrap();
        assert_eq!(jet.sample(0.0), [0.0, 0.0, 0.5]);
        assert_eq!(jet.sample(1.0), [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_blend_over() {
        let opaque = Rgba::new(10, 20, 30, 255);
        assert_eq!(opaque.blend_over((200, 200, 200)), (10, 20, 30));
        let clear = Rgba::new(10, 20, 30, 0);
        assert_eq!(clear.blend_over((200, 200, 200)), (200, 200, 200));
    }
}

use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::colormap;

/// Largest accepted `display.float_precision`.
pub const MAX_FLOAT_PRECISION: usize = 17;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a file inside the config directory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write the default template to `config.toml`, refusing to clobber an
    /// existing file unless `force` is set
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Pass force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub display: DisplayConfig,
    pub colormap: ColormapConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fractional digits for floats that have no format rule
    pub float_precision: usize,
    /// Thousands separators in default numeric formats
    pub grouping: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColormapConfig {
    pub default: String,
    pub samples: usize,
    pub alpha: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub negative: String,
    pub header: String,
    pub row_header: String,
    /// Opaque color that translucent overlays are blended onto
    pub overlay_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            display: DisplayConfig::default(),
            colormap: ColormapConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            float_precision: 4,
            grouping: true,
        }
    }
}

impl Default for ColormapConfig {
    fn default() -> Self {
        Self {
            default: colormap::DEFAULT_COLORMAP.to_string(),
            samples: colormap::DEFAULT_SAMPLES,
            alpha: None,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            negative: "red".to_string(),
            header: "white".to_string(),
            row_header: "dark_gray".to_string(),
            overlay_base: "#000000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_with(&ConfigManager::new(app_name)?)
    }

    /// Load using an explicit config location
    pub fn load_with(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();

        if let Some(user_config) = Self::load_user_config(manager)? {
            config.merge(user_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read `config.toml`; a missing file is not an error
    fn load_user_config(manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = manager.config_path("config.toml");
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.display.merge(other.display);
        self.colormap.merge(other.colormap);
        self.theme.merge(other.theme);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.display.float_precision > MAX_FLOAT_PRECISION {
            return Err(eyre!(
                "float_precision must be at most {}, got {}",
                MAX_FLOAT_PRECISION,
                self.display.float_precision
            ));
        }

        if self.colormap.samples == 0 {
            return Err(eyre!("colormap samples must be greater than 0"));
        }
        if !colormap::is_known(&self.colormap.default) {
            return Err(eyre!(
                "Unknown default colormap: '{}'. Available: {}",
                self.colormap.default,
                colormap::names().join(", ")
            ));
        }

        ColorMode::parse(&self.theme.color_mode)?;

        // NO_COLOR must not hide bad color strings
        let parser = ColorParser::with_capabilities(true, true, false);
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.float_precision != default.float_precision {
            self.float_precision = other.float_precision;
        }
        if other.grouping != default.grouping {
            self.grouping = other.grouping;
        }
    }
}

impl ColormapConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ColormapConfig::default();
        if other.default != default.default {
            self.default = other.default;
        }
        if other.samples != default.samples {
            self.samples = other.samples;
        }
        if other.alpha.is_some() {
            self.alpha = other.alpha;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        macro_rules! validate_color {
            ($field:expr, $name:expr) => {
                parser
                    .parse($field)
                    .map_err(|e| eyre!("Invalid color value for '{}': {}", $name, e))?;
            };
        }

        validate_color!(&self.negative, "negative");
        validate_color!(&self.header, "header");
        validate_color!(&self.row_header, "row_header");

        // overlays are blended in RGB space, so the base must be a hex color
        parse_hex(self.overlay_base.trim())
            .map_err(|e| eyre!("Invalid color value for 'overlay_base': {}", e))?;

        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        if other.negative != default.negative {
            self.negative = other.negative;
        }
        if other.header != default.header {
            self.header = other.header;
        }
        if other.row_header != default.row_header {
            self.row_header = other.row_header;
        }
        if other.overlay_base != default.overlay_base {
            self.overlay_base = other.overlay_base;
        }
    }
}

/// Terminal color depth requested by `theme.color_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    TrueColor,
    Palette256,
    Basic,
}

impl ColorMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(ColorMode::Auto),
            "truecolor" => Ok(ColorMode::TrueColor),
            "256" => Ok(ColorMode::Palette256),
            "basic" => Ok(ColorMode::Basic),
            other => Err(eyre!(
                "Invalid color_mode: {}. Must be 'auto', 'truecolor', '256', or 'basic'",
                other
            )),
        }
    }
}

/// Color parser with terminal capability detection
#[derive(Debug, Clone)]
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let support = supports_color::on(Stream::Stdout);
        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color: no_color_requested(),
        }
    }

    /// Parser for a configured color mode; `Auto` detects the terminal
    pub fn for_mode(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => Self::new(),
            ColorMode::TrueColor => Self::with_capabilities(true, true, no_color_requested()),
            ColorMode::Palette256 => Self::with_capabilities(false, true, no_color_requested()),
            ColorMode::Basic => Self::with_capabilities(false, false, no_color_requested()),
        }
    }

    /// Parser with fixed capabilities, independent of the environment
    pub fn with_capabilities(true_color: bool, palette_256: bool, no_color: bool) -> Self {
        Self {
            supports_true_color: true_color,
            supports_256: palette_256,
            no_color,
        }
    }

    /// Parse a color string (hex or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        // Hex format: "#ff0000" or "#FF0000" (6-character hex)
        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.rgb(r, g, b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" | "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => {
                Ok(Color::Indexed(8))
            }
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(n), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Convert RGB values to the best color the terminal can show
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Color {
        if self.no_color {
            Color::Reset
        } else if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

fn no_color_requested() -> bool {
    std::env::var("NO_COLOR").is_ok()
}

/// Parse hex color string (#ff0000) to RGB components
pub fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 || !s.is_ascii() {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest 256-color palette index
/// Uses standard xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    // near-equal channels go to the grayscale ramp (232-255)
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
    /// RGB that overlay colors are composited onto
    pub overlay_base: (u8, u8, u8),
}

impl Theme {
    /// Create a Theme from a ThemeConfig, honoring its color mode
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::for_mode(ColorMode::parse(&config.color_mode)?);
        Self::with_parser(config, &parser)
    }

    /// Create a Theme using an explicit parser
    pub fn with_parser(config: &ThemeConfig, parser: &ColorParser) -> Result<Self> {
        let mut colors = HashMap::new();
        colors.insert("negative".to_string(), parser.parse(&config.colors.negative)?);
        colors.insert("header".to_string(), parser.parse(&config.colors.header)?);
        colors.insert(
            "row_header".to_string(),
            parser.parse(&config.colors.row_header)?,
        );

        let overlay_base = parse_hex(config.colors.overlay_base.trim())?;

        Ok(Self {
            colors,
            overlay_base,
        })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

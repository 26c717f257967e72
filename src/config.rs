use color_eyre::eyre::eyre;
use color_eyre::Result;
use lscan_cli::{ExportFormat, ViewMode};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

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

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Read and parse `config.toml` from this directory. A missing file
    /// yields the defaults.
    pub fn load_file(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub backend: BackendConfig,
    pub scan: ScanConfig,
    pub clt: CltConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub export: ExportConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub modulus: u64,
    pub character: usize,
    pub start: f64,
    pub end: f64,
    pub real_part: f64,
    /// Amount Shift+Left/Right moves the end bound
    pub end_step: f64,
    pub view: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CltConfig {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Tick labels drawn on single-character charts
    pub max_x_ticks: usize,
    /// Columns in the per-character grid
    pub grid_columns: usize,
    pub show_info: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: Option<PathBuf>,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub border: String,
    pub border_active: String,
    pub loading: String,
    pub histogram_bar: String,
    pub reference_curve: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            backend: BackendConfig::default(),
            scan: ScanConfig::default(),
            clt: CltConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            export: ExportConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            modulus: 1,
            character: 1,
            start: 0.0,
            end: 100.0,
            real_part: 0.5,
            end_step: 10.0,
            view: "overlay".to_string(),
        }
    }
}

impl Default for CltConfig {
    fn default() -> Self {
        Self {
            start: 1000.0,
            end: 100000.0,
            samples: 1000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_x_ticks: 5,
            grid_columns: 3,
            show_info: true,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: "png".to_string(),
            width: 1200,
            height: 700,
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
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            border: "cyan".to_string(),
            border_active: "yellow".to_string(),
            loading: "yellow".to_string(),
            histogram_bar: "blue".to_string(),
            reference_curve: "red".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load defaults merged with the config file managed by `manager`.
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.load_file()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.backend.merge(other.backend);
        self.scan.merge(other.scan);
        self.clt.merge(other.clt);
        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.export.merge(other.export);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if self.backend.url.trim().is_empty() {
            return Err(eyre!("backend url must not be empty"));
        }

        if self.scan.end <= self.scan.start {
            return Err(eyre!(
                "scan end ({}) must be greater than scan start ({})",
                self.scan.end,
                self.scan.start
            ));
        }

        if self.scan.end_step <= 0.0 {
            return Err(eyre!("end_step must be greater than 0"));
        }

        if ViewMode::from_name(&self.scan.view).is_none() {
            return Err(eyre!(
                "Invalid view: {}. Must be one of real, complex, overlay, grid, clt",
                self.scan.view
            ));
        }

        if self.clt.end <= self.clt.start {
            return Err(eyre!(
                "clt end ({}) must be greater than clt start ({})",
                self.clt.end,
                self.clt.start
            ));
        }

        if self.clt.samples == 0 {
            return Err(eyre!("clt samples must be greater than 0"));
        }

        if self.display.grid_columns == 0 {
            return Err(eyre!("grid_columns must be greater than 0"));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if ExportFormat::from_name(&self.export.format).is_none() {
            return Err(eyre!(
                "Invalid export format: {}. Must be png, svg or json",
                self.export.format
            ));
        }

        if self.export.width == 0 || self.export.height == 0 {
            return Err(eyre!("export width and height must be greater than 0"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        if self.debug.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(eyre!(
                "Invalid log_level: {}. Must be off, error, warn, info, debug or trace",
                self.debug.log_level
            ));
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    pub fn view(&self) -> ViewMode {
        ViewMode::from_name(&self.scan.view).unwrap_or(ViewMode::Overlay)
    }

    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::from_name(&self.export.format).unwrap_or(ExportFormat::Png)
    }
}

// Each section takes the other's value wherever it differs from the default
impl BackendConfig {
    pub fn merge(&mut self, other: Self) {
        if other.url != BackendConfig::default().url {
            self.url = other.url;
        }
    }
}

impl ScanConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ScanConfig::default();
        if other.modulus != default.modulus {
            self.modulus = other.modulus;
        }
        if other.character != default.character {
            self.character = other.character;
        }
        if other.start != default.start {
            self.start = other.start;
        }
        if other.end != default.end {
            self.end = other.end;
        }
        if other.real_part != default.real_part {
            self.real_part = other.real_part;
        }
        if other.end_step != default.end_step {
            self.end_step = other.end_step;
        }
        if other.view != default.view {
            self.view = other.view;
        }
    }
}

impl CltConfig {
    pub fn merge(&mut self, other: Self) {
        let default = CltConfig::default();
        if other.start != default.start {
            self.start = other.start;
        }
        if other.end != default.end {
            self.end = other.end;
        }
        if other.samples != default.samples {
            self.samples = other.samples;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.max_x_ticks != default.max_x_ticks {
            self.max_x_ticks = other.max_x_ticks;
        }
        if other.grid_columns != default.grid_columns {
            self.grid_columns = other.grid_columns;
        }
        if other.show_info != default.show_info {
            self.show_info = other.show_info;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.format != default.format {
            self.format = other.format;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
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

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
    }
}

/// Calls `$f(name, &value)?` for every color field.
macro_rules! for_each_color {
    ($colors:expr, $f:ident) => {{
        let c = $colors;
        $f("primary", &c.primary)?;
        $f("secondary", &c.secondary)?;
        $f("error", &c.error)?;
        $f("warning", &c.warning)?;
        $f("dimmed", &c.dimmed)?;
        $f("controls_bg", &c.controls_bg)?;
        $f("text_primary", &c.text_primary)?;
        $f("text_secondary", &c.text_secondary)?;
        $f("border", &c.border)?;
        $f("border_active", &c.border_active)?;
        $f("loading", &c.loading)?;
        $f("histogram_bar", &c.histogram_bar)?;
        $f("reference_curve", &c.reference_curve)?;
    }};
}

impl ColorConfig {
    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        let check = |name: &str, value: &String| -> Result<()> {
            parser
                .parse(value)
                .map(|_| ())
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))
        };
        for_each_color!(self, check);
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();

        macro_rules! take_changed {
            ($($field:ident),*) => {
                $(
                    if other.$field != default.$field {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        take_changed!(
            primary,
            secondary,
            error,
            warning,
            dimmed,
            controls_bg,
            text_primary,
            text_secondary,
            border,
            border_active,
            loading,
            histogram_bar,
            reference_curve
        );
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.rgb(r, g, b));
        }

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

        match trimmed.to_lowercase().as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" | "default" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(N), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Best terminal color for an RGB triple given what the terminal supports.
    /// Series colors go through here too.
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

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let component = |range: std::ops::Range<usize>, name: &str| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(|| eyre!("Invalid {} component in hex color: {}", name, s))
    };

    Ok((component(1..3, "red")?, component(3..5, "green")?, component(5..7, "blue")?))
}

/// Nearest index in the xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // grayscale ramp 232-255
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 cube 16-231
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Nearest of the 8 basic ANSI colors
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
    parser_caps: (bool, bool, bool),
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();

        let mut insert = |name: &str, value: &String| -> Result<()> {
            colors.insert(name.to_string(), parser.parse(value)?);
            Ok(())
        };
        for_each_color!(&config.colors, insert);

        Ok(Self {
            colors,
            parser_caps: (
                parser.supports_true_color,
                parser.supports_256,
                parser.no_color,
            ),
        })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Map an RGB series color to what this terminal can show.
    pub fn rgb(&self, (r, g, b): (u8, u8, u8)) -> Color {
        let (supports_true_color, supports_256, no_color) = self.parser_caps;
        ColorParser {
            supports_true_color,
            supports_256,
            no_color,
        }
        .rgb(r, g, b)
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let parsed: AppConfig = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_merge_takes_non_defaults() {
        let mut base = AppConfig::default();
        let mut other = AppConfig::default();
        other.scan.modulus = 7;
        other.clt.samples = 5000;
        other.theme.colors.primary = "#ff0000".to_string();
        base.merge(other);
        assert_eq!(base.scan.modulus, 7);
        assert_eq!(base.clt.samples, 5000);
        assert_eq!(base.theme.colors.primary, "#ff0000");
        assert_eq!(base.scan.end, 100.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut c = AppConfig::default();
        c.scan.view = "polar".into();
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.clt.end = c.clt.start;
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.export.format = "eps".into();
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.performance.event_poll_interval_ms = 0;
        assert!(c.validate().is_err());

        let mut c = AppConfig::default();
        c.debug.log_level = "loud".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#336699").unwrap(), (0x33, 0x66, 0x99));
        assert!(parse_hex("#33669g").is_err());
        // seven bytes, but not seven characters
        assert!(parse_hex("#a\u{e9}x\u{e9}").is_err());
        assert!(parse_hex("#\u{e9}\u{e9}\u{e9}").is_err());
    }

    #[test]
    fn test_rgb_to_256() {
        assert_eq!(rgb_to_256_color(0, 0, 0), 16);
        assert_eq!(rgb_to_256_color(255, 0, 0), 196);
        assert_eq!(rgb_to_basic_ansi(217, 38, 38), Color::Red);
    }
}

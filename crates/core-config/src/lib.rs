//! Text field configuration loading and parsing.
//!
//! Parses `textfield.toml` (or an override path provided by the binary) into
//! a [`ConfigFile`]. Every field has a default so a missing file or a missing
//! section yields a fully usable configuration; unknown fields are ignored so
//! the format can grow without warnings.
//!
//! Sections:
//! * `[field]` content class, filtering, keyboard and clipboard policy.
//! * `[caret]` caret blink interval and width.
//! * `[gesture]` multi-tap timing and movement tolerances.
//! * `[auto_scroll]` hot-edge width and scroll speed bounds.
//! * `[obscure]` password character reveal duration.
//!
//! The raw hot edge is clamped against the live viewport by
//! [`Config::apply_context`]; the parsed value is retained so a later resize
//! can re-clamp.

use anyhow::{Context, Result};
use core_text::TextInputType;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "textfield.toml";

/// Key shown on the soft keyboard's action button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnterKeyType {
    #[default]
    Done,
    Go,
    Search,
    Send,
    Next,
    NewLine,
}

/// Scope in which copied text may be pasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyOptions {
    None,
    InApp,
    #[default]
    Local,
    Distributed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldConfig {
    #[serde(default)]
    pub input_type: TextInputType,
    #[serde(default)]
    pub max_length: Option<usize>,
    /// Regex every inserted cluster must match.
    #[serde(default)]
    pub input_filter: Option<String>,
    #[serde(default = "FieldConfig::default_true")]
    pub show_keyboard_on_focus: bool,
    #[serde(default)]
    pub custom_keyboard: bool,
    #[serde(default)]
    pub enter_key: EnterKeyType,
    #[serde(default)]
    pub copy_options: CopyOptions,
    #[serde(default)]
    pub show_cancel_button: bool,
    #[serde(default)]
    pub unit: Option<String>,
    /// Defaults to true for single-line fields and false for multiline ones.
    #[serde(default)]
    pub blur_on_submit: Option<bool>,
    #[serde(default = "FieldConfig::default_font_size")]
    pub font_size: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            input_type: TextInputType::default(),
            max_length: None,
            input_filter: None,
            show_keyboard_on_focus: true,
            custom_keyboard: false,
            enter_key: EnterKeyType::default(),
            copy_options: CopyOptions::default(),
            show_cancel_button: false,
            unit: None,
            blur_on_submit: None,
            font_size: Self::default_font_size(),
        }
    }
}

impl FieldConfig {
    const fn default_true() -> bool {
        true
    }
    const fn default_font_size() -> f32 {
        16.0
    }

    pub fn is_multiline(&self) -> bool {
        self.input_type.is_multiline()
    }

    pub fn blur_on_submit(&self) -> bool {
        self.blur_on_submit.unwrap_or(!self.is_multiline())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaretConfig {
    #[serde(default = "CaretConfig::default_twinkle_interval_ms")]
    pub twinkle_interval_ms: u64,
    #[serde(default = "CaretConfig::default_width")]
    pub width: f32,
}

impl Default for CaretConfig {
    fn default() -> Self {
        Self {
            twinkle_interval_ms: Self::default_twinkle_interval_ms(),
            width: Self::default_width(),
        }
    }
}

impl CaretConfig {
    const fn default_twinkle_interval_ms() -> u64 {
        500
    }
    const fn default_width() -> f32 {
        2.0
    }

    pub fn twinkle_interval(&self) -> Duration {
        Duration::from_millis(self.twinkle_interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GestureConfig {
    #[serde(default = "GestureConfig::default_double_tap_interval_ms")]
    pub double_tap_interval_ms: u64,
    #[serde(default = "GestureConfig::default_long_press_ms")]
    pub long_press_ms: u64,
    #[serde(default = "GestureConfig::default_tap_slop")]
    pub tap_slop: f32,
    #[serde(default = "GestureConfig::default_drag_slop")]
    pub drag_slop: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_interval_ms: Self::default_double_tap_interval_ms(),
            long_press_ms: Self::default_long_press_ms(),
            tap_slop: Self::default_tap_slop(),
            drag_slop: Self::default_drag_slop(),
        }
    }
}

impl GestureConfig {
    const fn default_double_tap_interval_ms() -> u64 {
        300
    }
    const fn default_long_press_ms() -> u64 {
        500
    }
    const fn default_tap_slop() -> f32 {
        5.0
    }
    const fn default_drag_slop() -> f32 {
        8.0
    }

    pub fn double_tap_interval(&self) -> Duration {
        Duration::from_millis(self.double_tap_interval_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AutoScrollConfig {
    #[serde(default = "AutoScrollConfig::default_hot_edge")]
    pub hot_edge: f32,
    /// Pixels per second at full penetration.
    #[serde(default = "AutoScrollConfig::default_max_speed")]
    pub max_speed: f32,
    /// Pixels per second right at the hot-edge boundary.
    #[serde(default = "AutoScrollConfig::default_min_speed")]
    pub min_speed: f32,
    #[serde(default = "AutoScrollConfig::default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            hot_edge: Self::default_hot_edge(),
            max_speed: Self::default_max_speed(),
            min_speed: Self::default_min_speed(),
            tick_ms: Self::default_tick_ms(),
        }
    }
}

impl AutoScrollConfig {
    const fn default_hot_edge() -> f32 {
        24.0
    }
    const fn default_max_speed() -> f32 {
        1200.0
    }
    const fn default_min_speed() -> f32 {
        120.0
    }
    const fn default_tick_ms() -> u64 {
        16
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObscureConfig {
    #[serde(default = "ObscureConfig::default_reveal_ms")]
    pub reveal_ms: u64,
}

impl Default for ObscureConfig {
    fn default() -> Self {
        Self {
            reveal_ms: Self::default_reveal_ms(),
        }
    }
}

impl ObscureConfig {
    const fn default_reveal_ms() -> u64 {
        1000
    }

    pub fn reveal(&self) -> Duration {
        Duration::from_millis(self.reveal_ms)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub caret: CaretConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub auto_scroll: AutoScrollConfig,
    #[serde(default)]
    pub obscure: ObscureConfig,
}

/// Viewport facts the effective configuration depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportContext {
    /// Extent of the content viewport along the scroll axis
    /// (width for single-line fields, height for multiline ones).
    pub scroll_extent: f32,
}

impl ViewportContext {
    pub fn new(scroll_extent: f32) -> Self {
        Self { scroll_extent }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective_hot_edge: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("textfield").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load configuration from `path` (or the discovered default). A missing file
/// yields defaults; a malformed file logs a warning and yields defaults.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match parse_str(&content) {
        Ok(mut cfg) => {
            cfg.raw = Some(content);
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

/// Parse configuration text; errors are returned, not defaulted.
pub fn parse_str(content: &str) -> Result<Config> {
    let file = toml::from_str::<ConfigFile>(content).context("parsing text field config")?;
    Ok(Config::from_file(file))
}

impl Config {
    pub fn from_file(file: ConfigFile) -> Self {
        let effective_hot_edge = file.auto_scroll.hot_edge.max(0.0);
        Self {
            raw: None,
            file,
            effective_hot_edge,
        }
    }

    /// Clamp the hot edge to half of the scroll extent so the two edges never
    /// overlap. Returns the effective value.
    pub fn apply_context(&mut self, ctx: ViewportContext) -> f32 {
        let raw = self.file.auto_scroll.hot_edge.max(0.0);
        let max = (ctx.scroll_extent / 2.0).max(0.0);
        let clamped = raw.min(max);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max,
                scroll_extent = ctx.scroll_extent,
                "auto_scroll_hot_edge_clamped"
            );
        }
        self.effective_hot_edge = clamped;
        clamped
    }

    /// Recompute on a viewport change. Returns `Some(new_value)` when the
    /// effective hot edge changed, else `None`.
    pub fn recompute_with_context(&mut self, ctx: ViewportContext) -> Option<f32> {
        let prev = self.effective_hot_edge;
        let current = self.apply_context(ctx);
        if current != prev { Some(current) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.field.input_type, TextInputType::Text);
        assert!(cfg.file.field.show_keyboard_on_focus);
        assert_eq!(cfg.file.caret.twinkle_interval_ms, 500);
        assert_eq!(cfg.file.gesture.double_tap_interval_ms, 300);
        assert_eq!(cfg.file.auto_scroll.hot_edge, 24.0);
        assert_eq!(cfg.file.obscure.reveal_ms, 1000);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_field_section() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[field]\ninput_type = \"number\"\nmax_length = 4\nenter_key = \"search\"\ncopy_options = \"none\"\ncustom_keyboard = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.field.input_type, TextInputType::Number);
        assert_eq!(cfg.file.field.max_length, Some(4));
        assert_eq!(cfg.file.field.enter_key, EnterKeyType::Search);
        assert_eq!(cfg.file.field.copy_options, CopyOptions::None);
        assert!(cfg.file.field.custom_keyboard);
        assert!(cfg.raw.is_some());
    }

    #[test]
    fn blur_on_submit_defaults_by_line_mode() {
        let single = FieldConfig::default();
        assert!(single.blur_on_submit());
        let multi = FieldConfig {
            input_type: TextInputType::Multiline,
            ..FieldConfig::default()
        };
        assert!(!multi.blur_on_submit());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[field\ninput_type = 3").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.field.input_type, TextInputType::Text);
        assert!(parse_str("[field\n").is_err());
    }

    #[test]
    fn hot_edge_clamped_to_half_extent() {
        let mut cfg = parse_str("[auto_scroll]\nhot_edge = 40.0\n").unwrap();
        assert_eq!(cfg.apply_context(ViewportContext::new(200.0)), 40.0);
        assert_eq!(cfg.apply_context(ViewportContext::new(50.0)), 25.0);
    }

    #[test]
    fn recompute_reports_only_changes() {
        let mut cfg = Config::default();
        cfg.apply_context(ViewportContext::new(300.0));
        assert_eq!(cfg.recompute_with_context(ViewportContext::new(300.0)), None);
        assert_eq!(cfg.recompute_with_context(ViewportContext::new(20.0)), Some(10.0));
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let mut cfg = parse_str("[auto_scroll]\nhot_edge = 30.0\n").unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            cfg.apply_context(ViewportContext::new(20.0));
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("auto_scroll_hot_edge_clamped"));
        assert_eq!(cfg.effective_hot_edge, 10.0);
    }
}

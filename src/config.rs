//! Chart configuration and color palettes
//!
//! Plain config structs with builder-style setters. A [`ChartConfig`] is
//! handed to the scene session once per mount/rebuild; it is not mutated by
//! the pipeline afterwards.

/// An RGB color in linear-ish 0..1 float components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#RRGGBB` hex string (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        })
    }

    /// RGBA array with full alpha, the form instance buffers want.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

/// Default palette: coral, teal, sky, sage, amber, orchid.
pub const PALETTE_DEFAULT: [Color; 6] = [
    Color::rgb(1.0, 0.4196, 0.4196),    // #FF6B6B
    Color::rgb(0.3059, 0.8039, 0.7686), // #4ECDC4
    Color::rgb(0.2706, 0.7176, 0.8196), // #45B7D1
    Color::rgb(0.5882, 0.8078, 0.7059), // #96CEB4
    Color::rgb(0.9961, 0.7922, 0.3412), // #FECA57
    Color::rgb(1.0, 0.6235, 0.9529),    // #FF9FF3
];

pub const PALETTE_OCEAN: [Color; 6] = [
    Color::rgb(0.0314, 0.2706, 0.5804), // #084593
    Color::rgb(0.1294, 0.4431, 0.7098), // #2171B5
    Color::rgb(0.2588, 0.5725, 0.7765), // #4292C6
    Color::rgb(0.4196, 0.6824, 0.8392), // #6BAED6
    Color::rgb(0.6196, 0.7922, 0.8824), // #9ECAE1
    Color::rgb(0.7765, 0.8588, 0.9373), // #C6DBEF
];

pub const PALETTE_SUNSET: [Color; 6] = [
    Color::rgb(0.9882, 0.3059, 0.1647), // #FC4E2A
    Color::rgb(0.9922, 0.5529, 0.2353), // #FD8D3C
    Color::rgb(0.9961, 0.6980, 0.2980), // #FEB24C
    Color::rgb(0.9961, 0.8510, 0.4627), // #FED976
    Color::rgb(1.0, 0.9294, 0.6275),    // #FFEDA0
    Color::rgb(0.7412, 0.0, 0.1490),    // #BD0026
];

pub const PALETTE_FOREST: [Color; 6] = [
    Color::rgb(0.0, 0.4275, 0.1725),    // #006D2C
    Color::rgb(0.1373, 0.5451, 0.2706), // #238B45
    Color::rgb(0.2549, 0.6706, 0.3647), // #41AB5D
    Color::rgb(0.4549, 0.7686, 0.4627), // #74C476
    Color::rgb(0.6314, 0.8510, 0.6078), // #A1D99B
    Color::rgb(0.7804, 0.9137, 0.7529), // #C7E9C0
];

pub const PALETTE_MONO: [Color; 6] = [
    Color::rgb(0.1451, 0.1451, 0.1451), // #252525
    Color::rgb(0.3255, 0.3255, 0.3255), // #535353
    Color::rgb(0.4549, 0.4549, 0.4549), // #747474
    Color::rgb(0.5882, 0.5882, 0.5882), // #969696
    Color::rgb(0.7412, 0.7412, 0.7412), // #BDBDBD
    Color::rgb(0.8510, 0.8510, 0.8510), // #D9D9D9
];

/// Looks up a built-in palette by its host-facing name.
pub fn palette_by_name(name: &str) -> Option<&'static [Color]> {
    match name {
        "default" => Some(&PALETTE_DEFAULT),
        "ocean" => Some(&PALETTE_OCEAN),
        "sunset" => Some(&PALETTE_SUNSET),
        "forest" => Some(&PALETTE_FOREST),
        "mono" => Some(&PALETTE_MONO),
        _ => None,
    }
}

/// Visibility policy for per-bar value labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueLabelMode {
    /// Value shown only while the bar is hovered.
    HoverOnly,
    /// Value always shown above the bar.
    Always,
}

/// Configuration for one chart session.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Bar colors, cycled via `index % palette.len()`. Never empty.
    pub palette: Vec<Color>,
    /// Positive multiplier applied to all time-based animation.
    pub animation_speed: f32,
    /// Chart title; shown in the HUD and stamped onto exports.
    pub title: String,
    /// When per-bar value labels are visible.
    pub value_labels: ValueLabelMode,
    /// Idle camera auto-orbit while the user is not dragging.
    pub idle_orbit: bool,
    /// World-space width of each bar footprint.
    pub bar_width: f32,
    /// World-space gap between adjacent bars.
    pub spacing: f32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            palette: PALETTE_DEFAULT.to_vec(),
            animation_speed: 0.5,
            title: String::new(),
            value_labels: ValueLabelMode::HoverOnly,
            idle_orbit: true,
            bar_width: 1.0,
            spacing: 0.5,
        }
    }
}

impl ChartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replaces the palette. An empty palette falls back to the default so
    /// the modulo cycle stays well-defined.
    pub fn with_palette(mut self, palette: &[Color]) -> Self {
        if palette.is_empty() {
            self.palette = PALETTE_DEFAULT.to_vec();
        } else {
            self.palette = palette.to_vec();
        }
        self
    }

    /// Sets the animation speed multiplier; non-positive input is clamped to
    /// a small positive value so animation always makes progress.
    pub fn with_animation_speed(mut self, speed: f32) -> Self {
        self.animation_speed = if speed > 0.0 { speed } else { 0.01 };
        self
    }

    pub fn with_value_labels(mut self, mode: ValueLabelMode) -> Self {
        self.value_labels = mode;
        self
    }

    pub fn with_idle_orbit(mut self, enabled: bool) -> Self {
        self.idle_orbit = enabled;
        self
    }

    pub fn with_bar_size(mut self, bar_width: f32, spacing: f32) -> Self {
        self.bar_width = bar_width.max(0.05);
        self.spacing = spacing.max(0.0);
        self
    }
}

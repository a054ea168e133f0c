use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 130, g: 200, b: 255 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 190, b: 90 };
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 210, g: 210, b: 210 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 120, g: 220, b: 200 };
pub const IPV6_ADDR: Color = Color::TrueColor { r: 180, g: 160, b: 255 };
pub const RESOLVER: Color = Color::Yellow;

pub const ORIGIN: Color = Color::Green;
pub const CDN: Color = Color::Red;
pub const WILDCARD: Color = Color::Magenta;
pub const SHARED: Color = Color::Yellow;

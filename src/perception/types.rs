use serde::{Deserialize, Serialize};

/// Pointer coordinate space of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One captured raster of the display. Lives only until it is encoded.
pub struct ScreenFrame {
    pub image: image::RgbaImage,
}

impl ScreenFrame {
    pub fn new(image: image::RgbaImage) -> Self {
        Self { image }
    }
}

/// A frame after encoding, ready to be attached to a message.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub mime: &'static str,
    pub base64: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedFrame {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

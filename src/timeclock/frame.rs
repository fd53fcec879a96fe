use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Raw RGB8 still taken from a video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

const CHANNELS: usize = 3;

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        (pixels.len() == expected).then_some(Self { width, height, pixels })
    }

    /// Flips left/right so the still matches the mirrored preview.
    pub fn mirrored(&self) -> Frame {
        let row_len = self.width as usize * CHANNELS;
        let mut pixels = Vec::with_capacity(self.pixels.len());

        for row in self.pixels.chunks_exact(row_len) {
            for pixel in row.chunks_exact(CHANNELS).rev() {
                pixels.extend_from_slice(pixel);
            }
        }

        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Binary PPM wrapped in a base64 data URL.
    pub fn to_data_url(&self) -> String {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut bytes = Vec::with_capacity(header.len() + self.pixels.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&self.pixels);

        format!("data:image/x-portable-pixmap;base64,{}", STANDARD.encode(bytes))
    }
}

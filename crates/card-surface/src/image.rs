//! Image lookup and PDF image objects

use crate::{ColorType, ImageStyle, Result, SurfaceError};
use lopdf::{Dictionary, Object, Stream};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

impl From<image::ImageError> for SurfaceError {
    fn from(err: image::ImageError) -> Self {
        SurfaceError::ImageError(err.to_string())
    }
}

/// Where markup image references are resolved
pub trait ImageSource {
    /// Pixel size of the image, or `None` when it cannot be loaded
    fn dimensions(&self, path: &str) -> Option<(u32, u32)>;

    /// Encoded image bytes for drawing
    fn load(&self, _path: &str) -> Option<Vec<u8>> {
        None
    }
}

/// A fixed size table; nothing can be loaded for drawing
impl ImageSource for HashMap<String, (u32, u32)> {
    fn dimensions(&self, path: &str) -> Option<(u32, u32)> {
        self.get(path).copied()
    }
}

/// Images read from disk relative to a root directory
///
/// Dimensions are cached per path, including failed lookups, so a missing
/// file is reported once.
#[derive(Debug)]
pub struct ImageStore {
    root: PathBuf,
    sizes: RefCell<HashMap<String, Option<(u32, u32)>>>,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sizes: RefCell::new(HashMap::new()),
        }
    }

    fn path_of(&self, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if candidate.is_absolute() {
            candidate
        } else {
            self.root.join(candidate)
        }
    }

    /// Forget cached dimensions (after files change on disk)
    pub fn clear(&self) {
        self.sizes.borrow_mut().clear();
    }
}

impl ImageSource for ImageStore {
    fn dimensions(&self, path: &str) -> Option<(u32, u32)> {
        if let Some(cached) = self.sizes.borrow().get(path) {
            return *cached;
        }

        let size = match image::image_dimensions(self.path_of(path)) {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("image {path} unavailable: {e}");
                None
            }
        };
        self.sizes.borrow_mut().insert(path.to_string(), size);
        size
    }

    fn load(&self, path: &str) -> Option<Vec<u8>> {
        std::fs::read(self.path_of(path))
            .map_err(|e| log::warn!("image {path} unreadable: {e}"))
            .ok()
    }
}

/// Image XObject ready for embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// Flate-compressed DeviceRGB samples
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Decode any supported image, apply `style` and compress the RGB samples
    ///
    /// Transparent pixels are blended against white.
    pub fn from_bytes(data: &[u8], style: &ImageStyle) -> Result<Self> {
        let decoded = image::load_from_memory(data)?.to_rgba8();
        let (width, height) = decoded.dimensions();

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in decoded.pixels() {
            let [r, g, b, a] = apply_style(pixel.0, style);
            let alpha = a as f32 / 255.0;
            for channel in [r, g, b] {
                rgb.push((channel as f32 * alpha + 255.0 * (1.0 - alpha)) as u8);
            }
        }

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&rgb)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", 8);
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        dict.set("Length", self.data.len() as i64);

        Stream::new(dict, self.data.clone())
    }
}

/// Apply colour matrix, colour type and tint to one RGBA pixel
pub(crate) fn apply_style(pixel: [u8; 4], style: &ImageStyle) -> [u8; 4] {
    let clamp = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    let [mut r, mut g, mut b, mut a] = pixel.map(|c| c as f32);

    if let Some([mr, mg, mb, ma]) = style.matrix {
        r *= mr;
        g *= mg;
        b *= mb;
        a *= ma;
    }

    match style.color_type {
        ColorType::Normal => {}
        ColorType::Grayscale => {
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;
            (r, g, b) = (luma, luma, luma);
        }
        ColorType::Sepia => {
            (r, g, b) = (
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            );
        }
        ColorType::Invert => {
            (r, g, b) = (255.0 - r, 255.0 - g, 255.0 - b);
        }
    }

    if let Some(tint) = style.tint {
        r *= tint.r as f32 / 255.0;
        g *= tint.g as f32 / 255.0;
        b *= tint.b as f32 / 255.0;
        a *= tint.a as f32 / 255.0;
    }

    [clamp(r), clamp(g), clamp(b), clamp(a)]
}

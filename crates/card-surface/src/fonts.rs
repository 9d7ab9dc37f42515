//! TrueType font families, measurement and PDF embedding

use crate::{FixedMetrics, FontSpec, Result, Size, SurfaceError, TextMeasurer};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeSet, HashMap};

/// One parsed TrueType face
#[derive(Debug, Clone)]
pub struct FontData {
    /// Variant name, e.g. `sarabun-bold`
    pub name: String,
    ttf_data: Vec<u8>,
}

impl FontData {
    /// Parse TrueType bytes
    ///
    /// # Arguments
    /// * `name` - Variant identifier (also used as the PDF BaseFont)
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| SurfaceError::FontParseError(format!("{name}: {e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: ttf_data.to_vec(),
        })
    }

    /// Face view over the owned bytes; parsing only reads the table directory
    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    pub fn units_per_em(&self) -> u16 {
        self.face().map(|f| f.units_per_em()).unwrap_or(1000)
    }

    pub fn ascender(&self) -> i16 {
        self.face().map(|f| f.ascender()).unwrap_or(800)
    }

    pub fn descender(&self) -> i16 {
        self.face().map(|f| f.descender()).unwrap_or(-200)
    }

    fn line_gap(&self) -> i16 {
        self.face().map(|f| f.line_gap()).unwrap_or(0)
    }

    fn to_points(&self, units: f32, size: f32) -> f32 {
        units / self.units_per_em() as f32 * size
    }

    /// Advance width of `text` in points
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let units: u32 = text
            .chars()
            .filter_map(|c| face.glyph_hor_advance(face.glyph_index(c)?))
            .map(u32::from)
            .sum();
        self.to_points(units as f32, size)
    }

    /// Line height in points (ascender - descender + line gap)
    pub fn line_height(&self, size: f32) -> f32 {
        let units = self.ascender() as f32 - self.descender() as f32 + self.line_gap() as f32;
        self.to_points(units, size)
    }

    pub fn ascent(&self, size: f32) -> f32 {
        self.to_points(self.ascender() as f32, size)
    }

    /// Hex string of glyph ids for an Identity-H `Tj`
    pub fn encode_hex(&self, text: &str) -> String {
        let body: String = text
            .chars()
            .map(|c| format!("{:04X}", self.glyph_id(c).unwrap_or(0)))
            .collect();
        format!("<{body}>")
    }

    /// Embed this face as a Type0 / CIDFontType2 font stored at `font_id`
    ///
    /// `font_id` is usually reserved with `Document::new_object_id` when the
    /// font is first referenced. Only the glyph widths and ToUnicode entries of
    /// `used` are written.
    pub fn embed(&self, doc: &mut Document, font_id: ObjectId, used: &BTreeSet<char>) {
        let base_font = Object::Name(self.name.clone().into_bytes());

        let file_id = doc.add_object(Stream::new(
            Dictionary::from_iter(vec![("Length1", (self.ttf_data.len() as i64).into())]),
            self.ttf_data.clone(),
        ));

        let ascender = self.ascender() as i64;
        let descender = self.descender() as i64;
        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", base_font.clone()),
            ("Flags", 4.into()),
            (
                "FontBBox",
                vec![
                    0.into(),
                    descender.into(),
                    (self.units_per_em() as i64).into(),
                    ascender.into(),
                ]
                .into(),
            ),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
            ("FontFile2", Object::Reference(file_id)),
        ]));

        let cid_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", base_font.clone()),
            (
                "CIDSystemInfo",
                Dictionary::from_iter(vec![
                    ("Registry", Object::string_literal("Adobe")),
                    ("Ordering", Object::string_literal("Identity")),
                    ("Supplement", 0.into()),
                ])
                .into(),
            ),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("W", self.widths(used).into()),
            ("DW", 1000.into()),
        ]));

        let cmap = self.to_unicode_cmap(used);
        let cmap_id = doc.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

        let type0 = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", base_font),
            ("Encoding", "Identity-H".into()),
            ("DescendantFonts", vec![Object::Reference(cid_id)].into()),
            ("ToUnicode", Object::Reference(cmap_id)),
        ]);
        doc.objects.insert(font_id, Object::Dictionary(type0));
    }

    /// `/W` entries in the `gid [width]` form, in thousandths of an em
    fn widths(&self, used: &BTreeSet<char>) -> Vec<Object> {
        let Some(face) = self.face() else {
            return Vec::new();
        };

        let mut gids: Vec<u16> = used.iter().filter_map(|&c| self.glyph_id(c)).collect();
        gids.sort_unstable();
        gids.dedup();

        let scale = 1000.0 / self.units_per_em() as f32;
        gids.into_iter()
            .flat_map(|gid| {
                let advance = face
                    .glyph_hor_advance(ttf_parser::GlyphId(gid))
                    .unwrap_or(1000) as f32;
                [
                    Object::Integer(gid as i64),
                    Object::Array(vec![Object::Integer((advance * scale).round() as i64)]),
                ]
            })
            .collect()
    }

    fn to_unicode_cmap(&self, used: &BTreeSet<char>) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );

        let chars: Vec<char> = used.iter().copied().collect();
        // bfchar sections hold at most 100 entries
        for chunk in chars.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &c in chunk {
                let mut utf16 = [0u16; 2];
                let target: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                let gid = self.glyph_id(c).unwrap_or(0);
                cmap.push_str(&format!("<{gid:04X}> <{target}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }
}

/// Font family with style variants
#[derive(Debug, Clone, Default)]
pub struct FontFamily {
    pub regular: Option<FontData>,
    pub bold: Option<FontData>,
    pub italic: Option<FontData>,
    pub bold_italic: Option<FontData>,
}

impl FontFamily {
    /// Best available variant; falls back toward regular
    pub fn variant(&self, bold: bool, italic: bool) -> Option<&FontData> {
        match (bold, italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .or(self.regular.as_ref()),
            (true, false) => self.bold.as_ref().or(self.regular.as_ref()),
            (false, true) => self.italic.as_ref().or(self.regular.as_ref()),
            (false, false) => self.regular.as_ref(),
        }
    }
}

/// Builder for registering font families
#[derive(Default)]
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
    italic: Option<Vec<u8>>,
    bold_italic: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, ttf_data: Vec<u8>) -> Self {
        self.regular = Some(ttf_data);
        self
    }

    pub fn bold(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold = Some(ttf_data);
        self
    }

    pub fn italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.italic = Some(ttf_data);
        self
    }

    pub fn bold_italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold_italic = Some(ttf_data);
        self
    }

    /// Parse every supplied variant; a regular variant is required
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let parse = |suffix: &str, data: Option<Vec<u8>>| {
            data.map(|d| FontData::from_ttf(&format!("{family_name}-{suffix}"), &d))
                .transpose()
        };

        if self.regular.is_none() {
            return Err(SurfaceError::FontParseError(format!(
                "font family {family_name} has no regular variant"
            )));
        }

        Ok(FontFamily {
            regular: parse("regular", self.regular)?,
            bold: parse("bold", self.bold)?,
            italic: parse("italic", self.italic)?,
            bold_italic: parse("bold-italic", self.bold_italic)?,
        })
    }
}

/// Registered font families, keyed by lower-cased family name
///
/// Measures with the TrueType metrics of the requested family. Families that
/// were never registered are measured with [`FixedMetrics`].
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    families: HashMap<String, FontFamily>,
    fallback: FixedMetrics,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font family
    ///
    /// # Example
    /// ```ignore
    /// fonts.register_family("sarabun",
    ///     FontFamilyBuilder::new()
    ///         .regular(std::fs::read("Sarabun-Regular.ttf")?)
    ///         .bold(std::fs::read("Sarabun-Bold.ttf")?)
    /// )?;
    /// ```
    pub fn register_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        let key = name.to_lowercase();
        if self.families.contains_key(&key) {
            return Err(SurfaceError::FontAlreadyExists(name.to_string()));
        }

        let family = builder.build(&key)?;
        self.families.insert(key, family);
        Ok(())
    }

    pub fn has_family(&self, name: &str) -> bool {
        self.families.contains_key(&name.to_lowercase())
    }

    /// Face used to draw `font`, if its family is registered
    pub fn resolve(&self, font: &FontSpec) -> Option<&FontData> {
        self.families
            .get(&font.family.to_lowercase())
            .and_then(|family| family.variant(font.bold, font.italic))
    }
}

impl TextMeasurer for FontBook {
    fn measure(&self, text: &str, font: &FontSpec) -> Size {
        match self.resolve(font) {
            Some(face) => Size::new(face.text_width(text, font.size), face.line_height(font.size)),
            None => self.fallback.measure(text, font),
        }
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        match self.resolve(font) {
            Some(face) => face.line_height(font.size),
            None => self.fallback.line_height(font),
        }
    }

    fn ascent(&self, font: &FontSpec) -> f32 {
        match self.resolve(font) {
            Some(face) => face.ascent(font.size),
            None => self.fallback.ascent(font),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faceless(name: &str) -> FontData {
        FontData {
            name: name.to_string(),
            ttf_data: vec![0u8; 16],
        }
    }

    /// Smallest face ttf-parser accepts: `head`, `hhea` and `maxp` only
    fn minimal_ttf() -> Vec<u8> {
        let mut head = vec![0u8; 54];
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        let mut hhea = vec![0u8; 36];
        hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
        hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
        hhea[8..10].copy_from_slice(&100i16.to_be_bytes());
        hhea[34..36].copy_from_slice(&1u16.to_be_bytes());
        let maxp = [0x00, 0x00, 0x50, 0x00, 0x00, 0x01];

        let mut data = Vec::new();
        data.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 6]);
        let mut offset = 12 + 3 * 16;
        for (tag, table) in [(b"head", &head[..]), (b"hhea", &hhea[..]), (b"maxp", &maxp[..])] {
            data.extend_from_slice(tag);
            data.extend_from_slice(&0u32.to_be_bytes());
            data.extend_from_slice(&(offset as u32).to_be_bytes());
            data.extend_from_slice(&(table.len() as u32).to_be_bytes());
            offset += table.len();
        }
        data.extend_from_slice(&head);
        data.extend_from_slice(&hhea);
        data.extend_from_slice(&maxp);
        data
    }

    #[test]
    fn test_metrics_read_from_owned_bytes() {
        let bytes = minimal_ttf();
        let font = FontData::from_ttf("mini", &bytes).unwrap();
        drop(bytes);

        assert_eq!(font.units_per_em(), 1000);
        assert_eq!(font.ascender(), 800);
        assert_eq!(font.descender(), -200);
        assert_eq!(font.line_height(10.0), 11.0);

        let copy = font.clone();
        drop(font);
        assert_eq!(copy.ascent(10.0), 8.0);
        assert_eq!(copy.text_width("abc", 10.0), 0.0);
    }

    #[test]
    fn test_invalid_ttf_rejected() {
        let err = FontData::from_ttf("broken", &[0u8; 32]).unwrap_err();
        assert!(matches!(err, SurfaceError::FontParseError(_)));
    }

    #[test]
    fn test_faceless_metrics_defaults() {
        let font = faceless("test");
        assert_eq!(font.units_per_em(), 1000);
        assert_eq!(font.ascender(), 800);
        assert_eq!(font.descender(), -200);
        assert_eq!(font.text_width("Hello", 12.0), 0.0);
        assert_eq!(font.line_height(10.0), 10.0);
    }

    #[test]
    fn test_encode_hex_without_face() {
        let font = faceless("test");
        assert_eq!(font.encode_hex(""), "<>");
        assert_eq!(font.encode_hex("AB"), "<00000000>");
    }

    #[test]
    fn test_to_unicode_cmap() {
        let font = faceless("test");
        let used: BTreeSet<char> = "BA".chars().collect();
        let cmap = font.to_unicode_cmap(&used);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0000> <0041>"));
        assert!(cmap.contains("<0000> <0042>"));
        assert!(cmap.ends_with("end\nend\n"));
    }

    #[test]
    fn test_embed_creates_type0_font() {
        let font = faceless("test");
        let mut doc = Document::with_version("1.5");
        let used: BTreeSet<char> = "A".chars().collect();
        let id = doc.new_object_id();
        font.embed(&mut doc, id, &used);

        let dict = doc.get_object(id).unwrap().as_dict().unwrap();
        assert_eq!(dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");
    }

    #[test]
    fn test_family_variant_fallback() {
        let family = FontFamily {
            regular: Some(faceless("f-regular")),
            bold: Some(faceless("f-bold")),
            italic: None,
            bold_italic: None,
        };
        assert_eq!(family.variant(false, false).unwrap().name, "f-regular");
        assert_eq!(family.variant(true, true).unwrap().name, "f-bold");
        assert_eq!(family.variant(false, true).unwrap().name, "f-regular");
    }

    #[test]
    fn test_builder_requires_regular() {
        let err = FontFamilyBuilder::new().bold(vec![0u8; 8]).build("x").unwrap_err();
        assert!(matches!(err, SurfaceError::FontParseError(_)));
    }

    #[test]
    fn test_font_book_falls_back_to_fixed_metrics() {
        let book = FontBook::new();
        let font = FontSpec::new("Missing", 10.0);
        assert!(!book.has_family("missing"));
        assert!(book.resolve(&font).is_none());
        assert_eq!(book.measure("abc", &font), FixedMetrics::default().measure("abc", &font));
    }
}

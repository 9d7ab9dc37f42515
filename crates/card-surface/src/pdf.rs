//! PDF output: one page per card

use crate::image::ImageXObject;
use crate::{
    Color, ElementFrame, FontBook, FontData, ImageDraw, ImageSource, Rect, Result, Surface,
    SurfaceError, TextDraw, TextMeasurer,
};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Content and resources of the card being drawn
struct PageBuffer {
    width: f32,
    height: f32,
    content: String,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
    states: BTreeMap<String, ObjectId>,
}

impl PageBuffer {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
            fonts: BTreeMap::new(),
            xobjects: BTreeMap::new(),
            states: BTreeMap::new(),
        }
    }
}

/// Resource name for `id`, allocating `{prefix}{n}` on first use
fn register_resource(map: &mut BTreeMap<String, ObjectId>, prefix: &str, id: ObjectId) -> String {
    if let Some((name, _)) = map.iter().find(|(_, v)| **v == id) {
        return name.clone();
    }
    let name = format!("{prefix}{}", map.len() + 1);
    map.insert(name.clone(), id);
    name
}

fn resource_dict(map: &BTreeMap<String, ObjectId>) -> Dictionary {
    let mut dict = Dictionary::new();
    for (name, id) in map {
        dict.set(name.as_str(), Object::Reference(*id));
    }
    dict
}

/// PDF literal string for the standard font (WinAnsi approximated by Latin-1)
fn literal_string(text: &str) -> String {
    let mut out = String::from("(");
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if (c as u32) < 0x100 => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out.push(')');
    out
}

/// Surface writing cards as pages of a new PDF document
///
/// Fonts registered in the [`FontBook`] are embedded as Type0 fonts once the
/// document is finished (so the glyph set is complete); families without
/// TrueType data draw with the standard Helvetica font.
pub struct PdfSurface<'a> {
    fonts: &'a FontBook,
    images: &'a dyn ImageSource,
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page: Option<PageBuffer>,
    /// Face name -> reserved Type0 object id
    font_ids: HashMap<String, ObjectId>,
    faces: HashMap<String, &'a FontData>,
    used_chars: HashMap<String, BTreeSet<char>>,
    standard_font: Option<ObjectId>,
    embedded_images: HashMap<String, ObjectId>,
    opacity_states: HashMap<u8, ObjectId>,
}

impl<'a> PdfSurface<'a> {
    pub fn new(fonts: &'a FontBook, images: &'a dyn ImageSource) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Self {
            fonts,
            images,
            doc,
            pages_id,
            page_ids: Vec::new(),
            page: None,
            font_ids: HashMap::new(),
            faces: HashMap::new(),
            used_chars: HashMap::new(),
            standard_font: None,
            embedded_images: HashMap::new(),
            opacity_states: HashMap::new(),
        }
    }

    /// Number of finished pages
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_mut(&mut self) -> Result<&mut PageBuffer> {
        self.page.as_mut().ok_or(SurfaceError::NoOpenCard)
    }

    fn push_ops(&mut self, ops: &str) -> Result<()> {
        self.page_mut()?.content.push_str(ops);
        Ok(())
    }

    fn font_object(&mut self, face: &'a FontData) -> ObjectId {
        if let Some(id) = self.font_ids.get(&face.name) {
            return *id;
        }
        let id = self.doc.new_object_id();
        self.font_ids.insert(face.name.clone(), id);
        self.faces.insert(face.name.clone(), face);
        id
    }

    fn standard_font_object(&mut self) -> ObjectId {
        if let Some(id) = self.standard_font {
            return id;
        }
        let id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", "Helvetica".into()),
            ("Encoding", "WinAnsiEncoding".into()),
        ]));
        self.standard_font = Some(id);
        id
    }

    /// `gs` operator for a constant alpha below 1.0
    fn opacity_ops(&mut self, alpha: f32) -> Result<String> {
        if alpha >= 1.0 {
            return Ok(String::new());
        }
        let key = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let doc = &mut self.doc;
        let id = *self.opacity_states.entry(key).or_insert_with(|| {
            let value = key as f32 / 255.0;
            doc.add_object(Dictionary::from_iter(vec![
                ("Type", "ExtGState".into()),
                ("ca", Object::Real(value.into())),
                ("CA", Object::Real(value.into())),
            ]))
        });
        let name = register_resource(&mut self.page_mut()?.states, "GS", id);
        Ok(format!("/{name} gs\n"))
    }

    fn image_object(&mut self, draw: &ImageDraw) -> Option<ObjectId> {
        let key = format!("{}|{:?}", draw.path, draw.style);
        if let Some(id) = self.embedded_images.get(&key) {
            return Some(*id);
        }

        let data = self.images.load(&draw.path)?;
        match ImageXObject::from_bytes(&data, &draw.style) {
            Ok(xobject) => {
                let id = self.doc.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(key, id);
                Some(id)
            }
            Err(e) => {
                log::warn!("skipping image {}: {e}", draw.path);
                None
            }
        }
    }

    /// Embed fonts, write the page tree and return the document
    pub fn finish(mut self) -> Result<Document> {
        if self.page.is_some() {
            self.end_card()?;
        }

        let empty = BTreeSet::new();
        for (name, id) in std::mem::take(&mut self.font_ids) {
            if let Some(face) = self.faces.get(&name) {
                let used = self.used_chars.get(&name).unwrap_or(&empty);
                face.embed(&mut self.doc, id, used);
            }
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", "Pages".into()),
                ("Kids", kids.into()),
                ("Count", count.into()),
            ])),
        );

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(self.doc)
    }

    /// Finish and serialize to bytes
    pub fn to_bytes(self) -> Result<Vec<u8>> {
        let mut doc = self.finish()?;
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| SurfaceError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Finish and write to a file
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let mut doc = self.finish()?;
        doc.save(path)
            .map_err(|e| SurfaceError::SaveError(e.to_string()))?;
        Ok(())
    }
}

impl Surface for PdfSurface<'_> {
    fn begin_card(&mut self, width: f32, height: f32) -> Result<()> {
        if self.page.is_some() {
            self.end_card()?;
        }
        self.page = Some(PageBuffer::new(width, height));
        Ok(())
    }

    fn end_card(&mut self) -> Result<()> {
        let page = self.page.take().ok_or(SurfaceError::NoOpenCard)?;

        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), page.content.into_bytes()));

        let mut resources = Dictionary::new();
        if !page.fonts.is_empty() {
            resources.set("Font", resource_dict(&page.fonts));
        }
        if !page.xobjects.is_empty() {
            resources.set("XObject", resource_dict(&page.xobjects));
        }
        if !page.states.is_empty() {
            resources.set("ExtGState", resource_dict(&page.states));
        }

        let page_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Page".into()),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                vec![
                    0.into(),
                    0.into(),
                    Object::Real(page.width.into()),
                    Object::Real(page.height.into()),
                ]
                .into(),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", resources.into()),
        ]));
        self.page_ids.push(page_id);
        Ok(())
    }

    fn begin_element(&mut self, frame: &ElementFrame) -> Result<()> {
        let card_height = self.page_mut()?.height;
        let opacity = self.opacity_ops(frame.opacity)?;

        let (sin, cos) = frame.rotation.to_radians().sin_cos();
        let ops = format!(
            "q\n{opacity}1 0 0 1 {} {} cm\n{cos} {} {sin} {cos} 0 0 cm\n1 0 0 -1 0 0 cm\n",
            frame.x,
            card_height - frame.y,
            -sin,
        );
        self.push_ops(&ops)
    }

    fn end_element(&mut self) -> Result<()> {
        self.push_ops("Q\n")
    }

    fn draw_text(&mut self, draw: &TextDraw) -> Result<()> {
        self.page_mut()?;
        if draw.text.is_empty() || draw.color.is_transparent() {
            return Ok(());
        }

        let fonts = self.fonts;
        let (font_id, encoded) = match fonts.resolve(&draw.font) {
            Some(face) => {
                self.used_chars
                    .entry(face.name.clone())
                    .or_default()
                    .extend(draw.text.chars());
                (self.font_object(face), face.encode_hex(&draw.text))
            }
            None => (self.standard_font_object(), literal_string(&draw.text)),
        };
        let resource = register_resource(&mut self.page_mut()?.fonts, "F", font_id);

        let ascent = fonts.ascent(&draw.font) * draw.scale_y;
        let (mut a, mut d) = (draw.scale_x, -draw.scale_y);
        let (mut x, mut baseline) = (draw.rect.x, draw.rect.y + ascent);
        if draw.mirror.horizontal {
            a = -a;
            x = draw.rect.right();
        }
        if draw.mirror.vertical {
            d = -d;
            baseline = draw.rect.bottom() - ascent;
        }

        let (r, g, b) = draw.color.unit_rgb();
        let mut ops = format!("BT\n{r} {g} {b} rg\n");
        match draw.outline {
            Some(outline) if outline.thickness > 0.0 => {
                let (or, og, ob) = outline.color.unit_rgb();
                ops.push_str(&format!(
                    "{} w\n{or} {og} {ob} RG\n2 Tr\n",
                    outline.thickness
                ));
            }
            _ => ops.push_str("0 Tr\n"),
        }
        ops.push_str(&format!("/{resource} {} Tf\n", draw.font.size));
        ops.push_str(&format!("{a} 0 0 {d} {x} {baseline} Tm\n{encoded} Tj\nET\n"));

        let thickness = (draw.font.size * 0.05 * draw.scale_y).max(0.5);
        let mut lines = Vec::new();
        if draw.font.underline {
            lines.push(baseline + draw.font.size * 0.1 * draw.scale_y);
        }
        if draw.font.strikeout {
            lines.push(baseline - ascent * 0.3);
        }
        for y in lines {
            ops.push_str(&format!(
                "{r} {g} {b} rg\n{} {y} {} {thickness} re\nf\n",
                draw.rect.x, draw.rect.width
            ));
        }

        self.push_ops(&ops)
    }

    fn draw_image(&mut self, draw: &ImageDraw) -> Result<()> {
        self.page_mut()?;
        if draw.rect.is_empty() {
            return Ok(());
        }
        let Some(id) = self.image_object(draw) else {
            return Ok(());
        };
        let name = register_resource(&mut self.page_mut()?.xobjects, "Im", id);

        let Rect {
            x,
            y,
            width,
            height,
        } = draw.rect;
        let (mut a, mut d, mut e, mut f) = (width, -height, x, y + height);
        if draw.mirror.horizontal {
            a = -width;
            e = x + width;
        }
        if draw.mirror.vertical {
            d = height;
            f = y;
        }
        self.push_ops(&format!("q\n{a} 0 0 {d} {e} {f} cm\n/{name} Do\nQ\n"))
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.page_mut()?;
        if color.is_transparent() || rect.is_empty() {
            return Ok(());
        }
        let opacity = self.opacity_ops(color.a as f32 / 255.0)?;
        let (r, g, b) = color.unit_rgb();
        self.push_ops(&format!(
            "q\n{opacity}{r} {g} {b} rg\n{} {} {} {} re\nf\nQ\n",
            rect.x, rect.y, rect.width, rect.height
        ))
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) -> Result<()> {
        self.page_mut()?;
        let (r, g, b) = color.unit_rgb();
        self.push_ops(&format!(
            "q\n{width} w\n{r} {g} {b} RG\n{} {} {} {} re\nS\nQ\n",
            rect.x, rect.y, rect.width, rect.height
        ))
    }
}

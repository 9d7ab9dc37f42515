//! In-memory surface that records every call

use crate::{Color, ElementFrame, ImageDraw, Rect, Result, Surface, TextDraw};

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginCard { width: f32, height: f32 },
    EndCard,
    BeginElement(ElementFrame),
    EndElement,
    Text(TextDraw),
    Image(ImageDraw),
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color, width: f32 },
}

/// Surface that keeps a list of [`DrawCommand`]s
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of every text draw, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<&ImageDraw> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Image(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(Rect, Color)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    pub fn card_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::BeginCard { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn begin_card(&mut self, width: f32, height: f32) -> Result<()> {
        self.commands.push(DrawCommand::BeginCard { width, height });
        Ok(())
    }

    fn end_card(&mut self) -> Result<()> {
        self.commands.push(DrawCommand::EndCard);
        Ok(())
    }

    fn begin_element(&mut self, frame: &ElementFrame) -> Result<()> {
        self.commands.push(DrawCommand::BeginElement(*frame));
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        self.commands.push(DrawCommand::EndElement);
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw) -> Result<()> {
        self.commands.push(DrawCommand::Text(draw.clone()));
        Ok(())
    }

    fn draw_image(&mut self, draw: &ImageDraw) -> Result<()> {
        self.commands.push(DrawCommand::Image(draw.clone()));
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.commands.push(DrawCommand::FillRect { rect, color });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) -> Result<()> {
        self.commands
            .push(DrawCommand::StrokeRect { rect, color, width });
        Ok(())
    }
}

// ============================================================================
// COMMAND LAYER — intents applied to the document with validated outcomes
// ============================================================================

use image::Rgba;

use crate::components::tools::{FigureKind, ToolKind};
use crate::document::Document;
use crate::error::EditError;
use crate::geometry::Rect;
use crate::io::{self, SaveFormat};
use crate::ops::brush::BrushShape;

/// Accepted line-width range.
pub const LINE_WIDTH_MAX: u32 = 500;
/// Accepted spacing range for the stroke walker.
pub const SPACING_MAX: u32 = 100;

/// An intent from the (external) command layer. Each application either
/// succeeds — possibly with a status message — or fails with a descriptive
/// error, leaving the document unchanged.
#[derive(Clone, Debug)]
pub enum Intent {
    SetTool(ToolKind),
    SelectSlot(usize),
    SetLineWidth(u32),
    /// `#RRGGBB` or `#AARRGGBB`.
    SetColor(String),
    SetBackground(String),
    SetBrushShape(BrushShape),
    SetSpacing(u32),
    SetHardness(f32),
    SetFigure(FigureKind),
    SetFigureFilled(bool),
    Resize { width: u32, height: u32 },
    Undo,
    Redo,
    Load(Vec<u8>),
    Save(SaveFormat),
}

/// What an applied intent produced.
#[derive(Default)]
pub struct Outcome {
    /// Human-readable status (content only; formatting is the caller's).
    pub message: Option<String>,
    /// Encoded bytes for a save intent.
    pub bytes: Option<Vec<u8>>,
    /// Canvas/screen region the intent dirtied.
    pub damage: Rect,
}

impl Outcome {
    fn quiet(damage: Rect) -> Self {
        Self {
            damage,
            ..Self::default()
        }
    }

    fn message(msg: impl Into<String>, damage: Rect) -> Self {
        Self {
            message: Some(msg.into()),
            damage,
            ..Self::default()
        }
    }
}

impl Document {
    /// Apply one command intent. Validation happens before any mutation.
    pub fn apply(&mut self, intent: Intent) -> Result<Outcome, EditError> {
        match intent {
            Intent::SetTool(kind) => Ok(Outcome::quiet(self.set_tool(kind))),
            Intent::SelectSlot(index) => {
                self.set_current_slot(index)?;
                Ok(Outcome::default())
            }
            Intent::SetLineWidth(width) => {
                if width == 0 || width > LINE_WIDTH_MAX {
                    return Err(EditError::InvalidParameter(format!(
                        "line width {width} out of range (1–{LINE_WIDTH_MAX})"
                    )));
                }
                self.slot_mut().props.line_width = width;
                Ok(Outcome::default())
            }
            Intent::SetColor(text) => {
                let color = parse_color(&text)?;
                self.slot_mut().props.color = color;
                Ok(Outcome::default())
            }
            Intent::SetBackground(text) => {
                let color = parse_color(&text)?;
                self.set_background(color);
                Ok(Outcome::default())
            }
            Intent::SetBrushShape(shape) => {
                self.slot_mut().props.brush_shape = shape;
                Ok(Outcome::default())
            }
            Intent::SetSpacing(spacing) => {
                if spacing == 0 || spacing > SPACING_MAX {
                    return Err(EditError::InvalidParameter(format!(
                        "spacing {spacing} out of range (1–{SPACING_MAX})"
                    )));
                }
                self.slot_mut().props.spacing = spacing;
                Ok(Outcome::default())
            }
            Intent::SetHardness(hardness) => {
                if !(0.0..=1.0).contains(&hardness) {
                    return Err(EditError::InvalidParameter(format!(
                        "hardness {hardness} out of range (0.0–1.0)"
                    )));
                }
                self.slot_mut().props.hardness = hardness;
                Ok(Outcome::default())
            }
            Intent::SetFigure(kind) => {
                self.slot_mut().props.figure = kind;
                Ok(Outcome::default())
            }
            Intent::SetFigureFilled(filled) => {
                self.slot_mut().props.figure_filled = filled;
                Ok(Outcome::default())
            }
            Intent::Resize { width, height } => {
                let damage = self.resize(width, height)?;
                Ok(Outcome::message(format!("resized to {width}×{height}"), damage))
            }
            Intent::Undo => match self.undo() {
                Some(damage) => Ok(Outcome::quiet(damage)),
                None => Ok(Outcome::message("nothing to undo", Rect::EMPTY)),
            },
            Intent::Redo => match self.redo() {
                Some(damage) => Ok(Outcome::quiet(damage)),
                None => Ok(Outcome::message("nothing to redo", Rect::EMPTY)),
            },
            Intent::Load(bytes) => {
                let surface = io::decode(&bytes)?;
                let (w, h) = (surface.width(), surface.height());
                let damage = self.replace_with(surface);
                Ok(Outcome::message(format!("loaded {w}×{h} image"), damage))
            }
            Intent::Save(format) => {
                let bytes = io::encode(&self.canvas().surface, format)?;
                Ok(Outcome {
                    message: Some(format!("encoded {} bytes", bytes.len())),
                    bytes: Some(bytes),
                    damage: Rect::EMPTY,
                })
            }
        }
    }
}

/// Parse `#RRGGBB` (opaque) or `#AARRGGBB` into a straight-alpha color.
/// The leading `#` is optional.
pub fn parse_color(text: &str) -> Result<Rgba<u8>, EditError> {
    let hex = text.trim().trim_start_matches('#');
    let parse = |s: &str| u8::from_str_radix(s, 16);
    match hex.len() {
        6 => {
            let (r, g, b) = (parse(&hex[0..2]), parse(&hex[2..4]), parse(&hex[4..6]));
            match (r, g, b) {
                (Ok(r), Ok(g), Ok(b)) => Ok(Rgba([r, g, b, 255])),
                _ => Err(EditError::ColorParse(text.to_string())),
            }
        }
        8 => {
            let (a, r, g, b) = (
                parse(&hex[0..2]),
                parse(&hex[2..4]),
                parse(&hex[4..6]),
                parse(&hex[6..8]),
            );
            match (a, r, g, b) {
                (Ok(a), Ok(r), Ok(g), Ok(b)) => Ok(Rgba([r, g, b, a])),
                _ => Err(EditError::ColorParse(text.to_string())),
            }
        }
        _ => Err(EditError::ColorParse(text.to_string())),
    }
}

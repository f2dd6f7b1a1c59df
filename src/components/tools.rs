// ============================================================================
// TOOL DISPATCHER — tagged tool states and the pointer-callback table
// ============================================================================

use image::Rgba;

use crate::canvas::{Canvas, premultiply, unpremultiply};
use crate::components::history::History;
use crate::geometry::{DamageRing, Rect};
use crate::ops::brush::{BrushCache, BrushParams, BrushShape, stamp_at};
use crate::ops::draw::walk_line;
use crate::ops::fill::flood_fill;
use crate::ops::shapes::{CIRCLE_SIDES, draw_regular_polygon};
use crate::overlay::Overlay;

/// A pointer event in canvas pixel coordinates.
///
/// `modifier` is the primary modifier key (straight-line stroke, copy
/// selection); `variant` is the secondary one (figure drawn from its
/// center).
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub modifier: bool,
    pub variant: bool,
}

impl PointerEvent {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            modifier: false,
            variant: false,
        }
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Closed set of tool tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolKind {
    Select,
    #[default]
    Drawer,
    Fill,
    Picker,
    Figure,
    Text,
}

/// Figure presets, each a regular-polygon vertex count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FigureKind {
    #[default]
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    Circle,
}

impl FigureKind {
    pub fn sides(&self) -> u32 {
        match self {
            FigureKind::Triangle => 3,
            FigureKind::Square => 4,
            FigureKind::Pentagon => 5,
            FigureKind::Hexagon => 6,
            FigureKind::Circle => CIRCLE_SIDES,
        }
    }
}

/// Per-slot tool settings. Straight-alpha color; premultiplication happens
/// at the pixel boundary.
#[derive(Clone, Copy, Debug)]
pub struct ToolProperties {
    pub line_width: u32,
    pub color: Rgba<u8>,
    pub brush_shape: BrushShape,
    /// Line-walker stride between stamps (≥ 1).
    pub spacing: u32,
    pub hardness: f32,
    pub figure: FigureKind,
    pub figure_filled: bool,
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            line_width: 4,
            color: Rgba([0, 0, 0, 255]),
            brush_shape: BrushShape::Circle,
            spacing: 1,
            hardness: 0.75,
            figure: FigureKind::default(),
            figure_filled: false,
        }
    }
}

// ----------------------------------------------------------------------------
// Per-tag payloads
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default)]
struct SelectState {
    anchor: Option<(i32, i32)>,
}

#[derive(Clone, Copy, Debug, Default)]
struct DrawerState {
    anchor: Option<(i32, i32)>,
    dragged: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct FigureState {
    anchor: Option<(i32, i32)>,
    ring: DamageRing,
}

/// Tool payload, replaced wholesale when the tag changes.
enum ToolState {
    Select(SelectState),
    Drawer(DrawerState),
    Fill,
    Picker,
    Figure(FigureState),
    Text,
}

impl ToolState {
    fn for_kind(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Select => ToolState::Select(SelectState::default()),
            ToolKind::Drawer => ToolState::Drawer(DrawerState::default()),
            ToolKind::Fill => ToolState::Fill,
            ToolKind::Picker => ToolState::Picker,
            ToolKind::Figure => ToolState::Figure(FigureState::default()),
            ToolKind::Text => ToolState::Text,
        }
    }
}

/// One tool-context slot: tag, settings, transient state and the brush
/// stamp cache the slot owns.
pub struct ToolSlot {
    kind: ToolKind,
    pub props: ToolProperties,
    pub cache: BrushCache,
    state: ToolState,
}

impl Default for ToolSlot {
    fn default() -> Self {
        Self::new(ToolKind::default())
    }
}

impl ToolSlot {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            props: ToolProperties::default(),
            cache: BrushCache::new(),
            state: ToolState::for_kind(kind),
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Switch the tag, replacing payload and callbacks atomically.
    pub fn set_kind(&mut self, kind: ToolKind) {
        self.kind = kind;
        self.state = ToolState::for_kind(kind);
    }

    fn brush_params(&self) -> BrushParams {
        BrushParams {
            shape: self.props.brush_shape,
            width: self.props.line_width.max(1),
            color: self.props.color,
            hardness: self.props.hardness.clamp(0.0, 1.0),
        }
    }
}

// ----------------------------------------------------------------------------
// Dispatch plumbing
// ----------------------------------------------------------------------------

/// Mutable document pieces a tool callback may touch.
pub struct ToolCtx<'a> {
    pub canvas: &'a mut Canvas,
    pub overlay: &'a mut Overlay,
    pub history: &'a mut History,
    pub background: Rgba<u8>,
}

/// What a callback asks the document to do after its own damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolAction {
    #[default]
    None,
    /// Blend the accumulated overlay into the canvas (stroke finished).
    CommitOverlay,
    /// The overlay now holds a selection; switch to transform preview.
    EnterTransformPreview,
    /// Anchor placed; switch the document to text entry.
    EnterTextEntry,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ToolOutcome {
    pub damage: Rect,
    pub action: ToolAction,
}

impl ToolOutcome {
    fn damage(damage: Rect) -> Self {
        Self {
            damage,
            action: ToolAction::None,
        }
    }

    fn with_action(damage: Rect, action: ToolAction) -> Self {
        Self { damage, action }
    }
}

pub type Handler = fn(&mut ToolSlot, &mut ToolCtx<'_>, &PointerEvent) -> ToolOutcome;

/// Capability table for one tool tag. Absent callbacks mean the event kind
/// is ignored by that tool.
#[derive(Clone, Copy, Default)]
pub struct Handlers {
    pub press: Option<Handler>,
    pub drag: Option<Handler>,
    pub release: Option<Handler>,
    pub motion: Option<Handler>,
}

/// The callback set for a tag. Selecting by tag (rather than dyn dispatch)
/// keeps the whole table in one place and the switch atomic.
pub fn handlers_for(kind: ToolKind) -> Handlers {
    match kind {
        ToolKind::Select => Handlers {
            press: Some(select_press),
            release: Some(select_release),
            ..Handlers::default()
        },
        ToolKind::Drawer => Handlers {
            press: Some(drawer_press),
            drag: Some(drawer_drag),
            release: Some(drawer_release),
            ..Handlers::default()
        },
        ToolKind::Fill => Handlers {
            release: Some(fill_release),
            ..Handlers::default()
        },
        ToolKind::Picker => Handlers {
            release: Some(picker_release),
            ..Handlers::default()
        },
        ToolKind::Figure => Handlers {
            press: Some(figure_press),
            drag: Some(figure_drag),
            release: Some(figure_release),
            ..Handlers::default()
        },
        ToolKind::Text => Handlers {
            release: Some(text_release),
            ..Handlers::default()
        },
    }
}

// ----------------------------------------------------------------------------
// Selection
// ----------------------------------------------------------------------------

fn select_press(slot: &mut ToolSlot, _ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    if let ToolState::Select(s) = &mut slot.state {
        s.anchor = Some(e.pos());
    }
    ToolOutcome::default()
}

fn select_release(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let ToolState::Select(s) = &mut slot.state else {
        return ToolOutcome::default();
    };
    let Some(anchor) = s.anchor.take() else {
        return ToolOutcome::default();
    };
    let rect = Rect::from_points(anchor.0, anchor.1, e.x, e.y);
    // Modifier selects the copy variant; the default cuts the source.
    let cut = !e.modifier;
    match ctx
        .overlay
        .capture_region(ctx.canvas, rect, cut, premultiply(ctx.background))
    {
        Ok(damage) => ToolOutcome::with_action(damage, ToolAction::EnterTransformPreview),
        Err(err) => {
            log::debug!("selection ignored: {err}");
            ToolOutcome::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Freehand drawer
// ----------------------------------------------------------------------------

fn stamp_overlay(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, x: i32, y: i32) -> Rect {
    let params = slot.brush_params();
    let r = stamp_at(ctx.overlay.surface_mut(), &mut slot.cache, &params, x, y);
    ctx.overlay.add_content(r);
    r
}

fn stroke_segment(
    slot: &mut ToolSlot,
    ctx: &mut ToolCtx<'_>,
    from: (i32, i32),
    to: (i32, i32),
    draw_first: bool,
) -> Rect {
    let params = slot.brush_params();
    let spacing = slot.props.spacing.max(1);
    let cache = &mut slot.cache;
    let overlay = &mut *ctx.overlay;
    let damage = walk_line(from, to, spacing, draw_first, |x, y| {
        stamp_at(overlay.surface_mut(), cache, &params, x, y)
    });
    overlay.add_content(damage);
    damage
}

fn drawer_press(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let cleared = ctx.overlay.begin_stroke();
    let stamped = stamp_overlay(slot, ctx, e.x, e.y);
    if let ToolState::Drawer(s) = &mut slot.state {
        s.anchor = Some(e.pos());
        s.dragged = false;
    }
    ToolOutcome::damage(cleared.expand(&stamped))
}

fn drawer_drag(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let anchor = match &mut slot.state {
        ToolState::Drawer(s) => {
            let a = s.anchor;
            s.anchor = Some(e.pos());
            s.dragged = true;
            a
        }
        _ => None,
    };
    let Some(anchor) = anchor else {
        return ToolOutcome::default();
    };
    // The anchor advances each event, so ground already covered is never
    // re-stamped; zero-distance repeats walk nothing.
    let damage = stroke_segment(slot, ctx, anchor, e.pos(), false);
    ToolOutcome::damage(damage)
}

fn drawer_release(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let (anchor, dragged) = match &slot.state {
        ToolState::Drawer(s) => (s.anchor, s.dragged),
        _ => (None, false),
    };
    let mut damage = Rect::EMPTY;
    if let Some(anchor) = anchor {
        if e.modifier && !dragged {
            // Straight-line shortcut: anchor → release in one segment.
            damage = stroke_segment(slot, ctx, anchor, e.pos(), false);
        }
    }
    if let ToolState::Drawer(s) = &mut slot.state {
        s.anchor = None;
        s.dragged = false;
    }
    ToolOutcome::with_action(damage, ToolAction::CommitOverlay)
}

// ----------------------------------------------------------------------------
// Flood fill
// ----------------------------------------------------------------------------

fn fill_release(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let target = premultiply(slot.props.color);
    // Fill a scratch copy first: the history patch must snapshot the
    // pre-mutation pixels, and the damaged region is only known afterwards.
    let mut work = ctx.canvas.surface.clone();
    let damage = flood_fill(&mut work, e.pos(), target);
    if damage.is_empty() {
        return ToolOutcome::default();
    }
    ctx.history.record_patch(ctx.canvas, damage);
    ctx.canvas
        .surface
        .copy_region(&work, damage, damage.left, damage.top);
    ToolOutcome::damage(damage)
}

// ----------------------------------------------------------------------------
// Color picker
// ----------------------------------------------------------------------------

fn picker_release(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    if let Some(px) = ctx.canvas.surface.get(e.x, e.y) {
        slot.props.color = unpremultiply(px);
    }
    ToolOutcome::default()
}

// ----------------------------------------------------------------------------
// Figure (regular polygon)
// ----------------------------------------------------------------------------

fn render_figure(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> Rect {
    let (anchor, stale) = match &slot.state {
        ToolState::Figure(s) => (s.anchor, s.ring.combined()),
        _ => (None, Rect::EMPTY),
    };
    let Some(anchor) = anchor else {
        return Rect::EMPTY;
    };

    // Erase the previous event's preview, then draw from scratch.
    ctx.overlay.surface_mut().clear_rect(stale);
    let damage = draw_regular_polygon(
        ctx.overlay.surface_mut(),
        &mut slot.cache,
        anchor,
        e.pos(),
        slot.props.figure.sides(),
        slot.props.line_width,
        slot.props.color,
        slot.props.figure_filled,
        e.variant,
    );
    ctx.overlay.add_content(damage);

    match &mut slot.state {
        ToolState::Figure(s) => s.ring.push(damage),
        _ => damage,
    }
}

fn figure_press(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let cleared = ctx.overlay.begin_stroke();
    if let ToolState::Figure(s) = &mut slot.state {
        s.anchor = Some(e.pos());
        s.ring.reset();
    }
    ToolOutcome::damage(cleared)
}

fn figure_drag(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    ToolOutcome::damage(render_figure(slot, ctx, e))
}

fn figure_release(slot: &mut ToolSlot, ctx: &mut ToolCtx<'_>, e: &PointerEvent) -> ToolOutcome {
    let damage = render_figure(slot, ctx, e);
    if let ToolState::Figure(s) = &mut slot.state {
        s.anchor = None;
        s.ring.reset();
    }
    ToolOutcome::with_action(damage, ToolAction::CommitOverlay)
}

// ----------------------------------------------------------------------------
// Text
// ----------------------------------------------------------------------------

fn text_release(_slot: &mut ToolSlot, _ctx: &mut ToolCtx<'_>, _e: &PointerEvent) -> ToolOutcome {
    // The document records the anchor and flips to text-entry mode; glyph
    // shaping happens outside the core.
    ToolOutcome::with_action(Rect::EMPTY, ToolAction::EnterTextEntry)
}

use image::Rgba;
use rasterpad::canvas::premultiply;
use rasterpad::commands::{Intent, parse_color};
use rasterpad::components::tools::{PointerEvent, ToolKind};
use rasterpad::canvas::Surface;
use rasterpad::document::{Document, InputMode, move_lock};
use rasterpad::geometry::Rect;
use rasterpad::io::SaveFormat;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn raw(doc: &Document) -> Vec<u8> {
    doc.canvas().surface.as_image().as_raw().clone()
}

fn drag_modifier(x: i32, y: i32) -> PointerEvent {
    PointerEvent {
        x,
        y,
        modifier: true,
        variant: false,
    }
}

// ---------------------------------------------------------------------------
// Stroke → commit → undo
// ---------------------------------------------------------------------------

#[test]
fn test_drawer_stroke_commits_once_and_undoes_exactly() {
    let mut doc = Document::new(16, 16, WHITE);
    let before = raw(&doc);

    doc.pointer_pressed(PointerEvent::at(2, 2));
    // Mid-stroke: the canvas is untouched, the screen shows the preview.
    assert_eq!(doc.canvas().surface.get(2, 2), Some(WHITE));
    assert_ne!(doc.screen().get(2, 2), Some(WHITE));

    doc.pointer_dragged(PointerEvent::at(8, 2));
    doc.pointer_released(PointerEvent::at(8, 2));

    // Committed: canvas mutated, overlay cleared, exactly one entry.
    assert_ne!(doc.canvas().surface.get(2, 2), Some(WHITE));
    assert!(doc.overlay().is_empty());
    assert_eq!(doc.history().undo_count(), 1);
    let after = raw(&doc);

    doc.undo().expect("undo");
    assert_eq!(raw(&doc), before);
    doc.redo().expect("redo");
    assert_eq!(raw(&doc), after);
}

#[test]
fn test_drawer_straight_line_modifier() {
    let mut doc = Document::new(16, 16, WHITE);
    doc.apply(Intent::SetLineWidth(1)).unwrap();
    doc.pointer_pressed(PointerEvent::at(1, 1));
    // Release with the modifier, without dragging: straight segment.
    doc.pointer_released(drag_modifier(9, 1));

    for x in 1..=9 {
        assert_ne!(doc.canvas().surface.get(x, 1), Some(WHITE), "pixel ({x},1)");
    }
    assert_eq!(doc.canvas().surface.get(5, 2), Some(WHITE));
}

#[test]
fn test_zero_distance_drag_repeats_are_harmless() {
    let mut doc = Document::new(16, 16, WHITE);
    doc.pointer_pressed(PointerEvent::at(5, 5));
    for _ in 0..10 {
        doc.pointer_dragged(PointerEvent::at(5, 5));
    }
    doc.pointer_released(PointerEvent::at(5, 5));
    assert_eq!(doc.history().undo_count(), 1);
    doc.undo().unwrap();
    assert_eq!(doc.canvas().surface.get(5, 5), Some(WHITE));
}

// ---------------------------------------------------------------------------
// Selection / transform preview
// ---------------------------------------------------------------------------

#[test]
fn test_cut_translate_commit_undo() {
    let mut doc = Document::new(12, 12, WHITE);
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(2, 2, 5, 5), premultiply(RED));
    let before = raw(&doc);

    doc.set_tool(ToolKind::Select);
    doc.pointer_pressed(PointerEvent::at(2, 2));
    doc.pointer_released(PointerEvent::at(5, 5));
    assert_eq!(doc.mode(), InputMode::TransformPreview);

    // The cut source is background while previewing; canvas content
    // elsewhere untouched.
    assert_eq!(doc.canvas().surface.get(3, 3), Some(WHITE));

    // Drag the preview 3 px right.
    doc.pointer_pressed(PointerEvent::at(0, 0));
    doc.pointer_dragged(PointerEvent::at(3, 0));
    doc.pointer_released(PointerEvent::at(3, 0));

    // Leaving the mode bakes the overlay.
    doc.set_mode(InputMode::Interact);
    assert_eq!(doc.mode(), InputMode::Interact);
    assert!(doc.overlay().is_empty());

    // Content reappears at {5,2,8,5}; the source is background.
    assert_eq!(doc.canvas().surface.get(5, 2), Some(RED));
    assert_eq!(doc.canvas().surface.get(8, 5), Some(RED));
    assert_eq!(doc.canvas().surface.get(2, 2), Some(WHITE));
    assert_eq!(doc.canvas().surface.get(4, 4), Some(WHITE));

    // One history entry; undo restores the pre-cut canvas exactly.
    assert_eq!(doc.history().undo_count(), 1);
    doc.undo().expect("undo");
    assert_eq!(raw(&doc), before);
}

#[test]
fn test_copy_variant_leaves_source() {
    let mut doc = Document::new(12, 12, WHITE);
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(2, 2, 5, 5), premultiply(RED));

    doc.set_tool(ToolKind::Select);
    doc.pointer_pressed(PointerEvent::at(2, 2));
    doc.pointer_released(drag_modifier(5, 5));
    assert_eq!(doc.mode(), InputMode::TransformPreview);
    // Copy: the source survives.
    assert_eq!(doc.canvas().surface.get(3, 3), Some(RED));

    doc.pointer_pressed(PointerEvent::at(0, 0));
    doc.pointer_dragged(PointerEvent::at(4, 0));
    doc.pointer_released(PointerEvent::at(4, 0));
    doc.commit_overlay();

    assert_eq!(doc.canvas().surface.get(3, 3), Some(RED));
    assert_eq!(doc.canvas().surface.get(7, 3), Some(RED));
}

#[test]
fn test_cancel_restores_cut_source() {
    let mut doc = Document::new(12, 12, WHITE);
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(2, 2, 5, 5), premultiply(RED));
    let before = raw(&doc);

    doc.set_tool(ToolKind::Select);
    doc.pointer_pressed(PointerEvent::at(2, 2));
    doc.pointer_released(PointerEvent::at(5, 5));
    assert_eq!(doc.canvas().surface.get(3, 3), Some(WHITE));

    // Cancel: no partial blends, the cut source comes back, no history.
    doc.cancel_overlay();
    assert_eq!(doc.mode(), InputMode::Interact);
    assert_eq!(raw(&doc), before);
    assert_eq!(doc.history().undo_count(), 0);
}

#[test]
fn test_switching_tools_clears_preview() {
    let mut doc = Document::new(12, 12, WHITE);
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(2, 2, 5, 5), premultiply(RED));
    let before = raw(&doc);

    doc.set_tool(ToolKind::Select);
    doc.pointer_pressed(PointerEvent::at(2, 2));
    doc.pointer_released(PointerEvent::at(5, 5));

    doc.set_tool(ToolKind::Drawer);
    assert_eq!(doc.mode(), InputMode::Interact);
    assert!(doc.overlay().is_empty());
    assert_eq!(raw(&doc), before);
}

// ---------------------------------------------------------------------------
// Fill / picker / figure tools
// ---------------------------------------------------------------------------

#[test]
fn test_fill_tool_floods_canvas() {
    let mut doc = Document::new(10, 10, Rgba([0, 0, 0, 255]));
    doc.set_tool(ToolKind::Fill);
    doc.apply(Intent::SetColor("#FFFFFF".into())).unwrap();

    let damage = doc.pointer_released(PointerEvent::at(5, 5));
    assert_eq!(damage, Rect::new(0, 0, 9, 9));
    assert_eq!(doc.canvas().surface.get(0, 0), Some(WHITE));
    assert_eq!(doc.canvas().surface.get(9, 9), Some(WHITE));
    assert_eq!(doc.history().undo_count(), 1);

    // Filling again with the same color is a no-op.
    let damage = doc.pointer_released(PointerEvent::at(5, 5));
    assert!(damage.is_empty());
    assert_eq!(doc.history().undo_count(), 1);
}

#[test]
fn test_picker_reads_canvas_color() {
    let mut doc = Document::new(8, 8, WHITE);
    doc.canvas_mut().surface.put(3, 3, premultiply(GREEN));

    doc.set_tool(ToolKind::Picker);
    doc.pointer_released(PointerEvent::at(3, 3));
    assert_eq!(doc.slot().props.color, GREEN);

    // Out of bounds: current color unchanged.
    doc.pointer_released(PointerEvent::at(-5, 3));
    assert_eq!(doc.slot().props.color, GREEN);
}

#[test]
fn test_figure_tool_rerenders_and_commits() {
    let mut doc = Document::new(64, 64, WHITE);
    doc.set_tool(ToolKind::Figure);
    doc.apply(Intent::SetColor("#FF0000".into())).unwrap();
    doc.apply(Intent::SetLineWidth(2)).unwrap();

    doc.pointer_pressed(PointerEvent::at(20, 20));
    // Rubber-band through two sizes; the old preview must not linger.
    doc.pointer_dragged(PointerEvent::at(50, 50));
    doc.pointer_dragged(PointerEvent::at(40, 40));
    doc.pointer_released(PointerEvent::at(40, 40));

    assert!(doc.overlay().is_empty());
    assert_eq!(doc.history().undo_count(), 1);

    // No stale pixels from the larger preview beyond the final figure.
    for x in 45..64 {
        for y in 45..64 {
            assert_eq!(doc.canvas().surface.get(x, y), Some(WHITE), "stale at ({x},{y})");
        }
    }
    // The final figure left some ink.
    let painted = (0..64)
        .flat_map(|y| (0..64).map(move |x| (x, y)))
        .filter(|&(x, y)| doc.canvas().surface.get(x, y) != Some(WHITE))
        .count();
    assert!(painted > 10);
}

// ---------------------------------------------------------------------------
// Text flow
// ---------------------------------------------------------------------------

#[test]
fn test_text_anchor_and_bitmap_commit() {
    let mut doc = Document::new(16, 16, WHITE);
    doc.set_tool(ToolKind::Text);
    doc.pointer_released(PointerEvent::at(4, 4));
    assert_eq!(doc.mode(), InputMode::TextEntry);
    assert_eq!(doc.text_anchor(), Some((4, 4)));

    // An externally shaped 3×1 bitmap lands at the anchor.
    let bitmap = Surface::new_filled(3, 1, premultiply(GREEN));
    doc.place_text_bitmap(&bitmap).expect("place");
    assert_eq!(doc.canvas().surface.get(4, 4), Some(WHITE));

    // Leaving text entry bakes it.
    doc.set_mode(InputMode::Interact);
    assert_eq!(doc.canvas().surface.get(4, 4), Some(GREEN));
    assert_eq!(doc.canvas().surface.get(6, 4), Some(GREEN));
    assert_eq!(doc.canvas().surface.get(7, 4), Some(WHITE));
    assert_eq!(doc.history().undo_count(), 1);

    doc.undo().unwrap();
    assert_eq!(doc.canvas().surface.get(4, 4), Some(WHITE));
}

#[test]
fn test_place_text_requires_text_mode() {
    let mut doc = Document::new(8, 8, WHITE);
    let bitmap = Surface::new_filled(2, 2, premultiply(GREEN));
    assert!(doc.place_text_bitmap(&bitmap).is_err());
}

// ---------------------------------------------------------------------------
// Resize and intents
// ---------------------------------------------------------------------------

#[test]
fn test_resize_intent_round_trip() {
    let mut doc = Document::new(10, 10, WHITE);
    doc.canvas_mut().surface.put(0, 0, premultiply(RED));
    doc.canvas_mut().surface.put(9, 9, premultiply(GREEN));
    let before = raw(&doc);

    let outcome = doc.apply(Intent::Resize { width: 15, height: 8 }).unwrap();
    assert!(outcome.message.is_some());
    assert_eq!((doc.canvas().width(), doc.canvas().height()), (15, 8));
    // New columns get background, old content stays top-left anchored,
    // the discarded rows are gone.
    assert_eq!(doc.canvas().surface.get(12, 4), Some(WHITE));
    assert_eq!(doc.canvas().surface.get(0, 0), Some(RED));
    assert_eq!(doc.history().undo_count(), 1);

    doc.undo().expect("undo resize");
    assert_eq!((doc.canvas().width(), doc.canvas().height()), (10, 10));
    assert_eq!(raw(&doc), before);
    assert_eq!(doc.canvas().surface.get(9, 9), Some(GREEN));
}

#[test]
fn test_invalid_intents_leave_state_unchanged() {
    let mut doc = Document::new(8, 8, WHITE);
    let before = raw(&doc);

    assert!(doc.apply(Intent::SetLineWidth(0)).is_err());
    assert!(doc.apply(Intent::SetLineWidth(100_000)).is_err());
    assert!(doc.apply(Intent::SetSpacing(0)).is_err());
    assert!(doc.apply(Intent::SetHardness(1.5)).is_err());
    assert!(doc.apply(Intent::Resize { width: 0, height: 5 }).is_err());
    assert!(doc.apply(Intent::SetColor("#XYZ".into())).is_err());
    assert!(doc.apply(Intent::Load(vec![1, 2, 3])).is_err());

    assert_eq!(raw(&doc), before);
    assert_eq!(doc.history().undo_count(), 0);
}

#[test]
fn test_undo_redo_intents_report_when_empty() {
    let mut doc = Document::new(8, 8, WHITE);
    let outcome = doc.apply(Intent::Undo).unwrap();
    assert_eq!(outcome.message.as_deref(), Some("nothing to undo"));
    let outcome = doc.apply(Intent::Redo).unwrap();
    assert_eq!(outcome.message.as_deref(), Some("nothing to redo"));
}

#[test]
fn test_save_load_round_trip() {
    let mut doc = Document::new(6, 6, WHITE);
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(1, 1, 4, 4), premultiply(RED));
    let content = raw(&doc);

    let saved = doc.apply(Intent::Save(SaveFormat::Png)).unwrap();
    let bytes = saved.bytes.expect("png bytes");

    // Scribble, then load the saved bytes back.
    doc.canvas_mut()
        .surface
        .fill_rect(Rect::new(0, 0, 5, 5), premultiply(GREEN));
    doc.apply(Intent::Load(bytes)).unwrap();
    assert_eq!(raw(&doc), content);
    // Loading resets the undo history.
    assert_eq!(doc.history().undo_count(), 0);
}

#[test]
fn test_jpeg_quality_validation() {
    let mut doc = Document::new(4, 4, WHITE);
    assert!(doc.apply(Intent::Save(SaveFormat::Jpeg { quality: 0 })).is_err());
    assert!(doc.apply(Intent::Save(SaveFormat::Jpeg { quality: 90 })).is_ok());
}

// ---------------------------------------------------------------------------
// Tool slots, zoom, move-lock, color parsing
// ---------------------------------------------------------------------------

#[test]
fn test_tool_slots_remember_settings() {
    let mut doc = Document::new(8, 8, WHITE);
    doc.apply(Intent::SetLineWidth(9)).unwrap();
    doc.apply(Intent::SelectSlot(1)).unwrap();
    doc.apply(Intent::SetLineWidth(21)).unwrap();

    assert_eq!(doc.slot().props.line_width, 21);
    doc.apply(Intent::SelectSlot(0)).unwrap();
    assert_eq!(doc.slot().props.line_width, 9);

    assert!(doc.apply(Intent::SelectSlot(7)).is_err());
}

#[test]
fn test_zoom_steps_clamp_exponential() {
    let mut doc = Document::new(8, 8, WHITE);
    doc.canvas_mut().set_zoom_step(2);
    assert_eq!(doc.canvas().zoom_scale(), 4.0);
    doc.canvas_mut().set_zoom_step(100);
    assert_eq!(doc.canvas().zoom_step(), 4);
    doc.canvas_mut().set_zoom_step(-100);
    assert_eq!(doc.canvas().zoom_step(), -4);
    assert_eq!(doc.canvas().zoom_scale(), 1.0 / 16.0);
}

#[test]
fn test_move_lock_thresholds() {
    // Below the 2 px minimum: unchanged.
    assert_eq!(move_lock(1, 1), (1, 1));
    // Shallow slope locks to the horizontal axis.
    assert_eq!(move_lock(10, 2), (10, 0));
    // Steep slope locks to the vertical axis.
    assert_eq!(move_lock(2, 10), (0, 10));
    // Mid slopes lock to the 45° diagonal, keeping the larger magnitude.
    assert_eq!(move_lock(8, 6), (8, 8));
    assert_eq!(move_lock(-6, 8), (-8, 8));
    // Pure vertical never divides by zero.
    assert_eq!(move_lock(0, 9), (0, 9));
}

#[test]
fn test_parse_color_forms() {
    assert_eq!(parse_color("#FF8800").unwrap(), Rgba([255, 136, 0, 255]));
    assert_eq!(parse_color("80FF0000").unwrap(), Rgba([255, 0, 0, 128]));
    assert_eq!(parse_color("  #00ff00 ").unwrap(), Rgba([0, 255, 0, 255]));
    assert!(parse_color("#F80").is_err());
    assert!(parse_color("not a color").is_err());
}

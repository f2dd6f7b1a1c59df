use image::Rgba;
use rasterpad::canvas::{Canvas, premultiply};
use rasterpad::components::history::{History, HistoryEntry};
use rasterpad::geometry::Rect;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn raw(canvas: &Canvas) -> Vec<u8> {
    canvas.surface.as_image().as_raw().clone()
}

#[test]
fn test_patch_undo_redo_round_trip() {
    let mut canvas = Canvas::new(8, 8, premultiply(WHITE));
    let mut history = History::default();

    let before = raw(&canvas);

    // Record the pre-mutation pixels, then mutate.
    let region = Rect::new(2, 2, 5, 5);
    history.record_patch(&canvas, region);
    canvas.surface.fill_rect(region, premultiply(RED));
    let after = raw(&canvas);

    // Undo restores the pre-mutation bytes exactly.
    let damage = history.undo(&mut canvas).expect("undo");
    assert_eq!(damage, region);
    assert_eq!(raw(&canvas), before);

    // Redo restores the post-mutation bytes exactly.
    let damage = history.redo(&mut canvas).expect("redo");
    assert_eq!(damage, region);
    assert_eq!(raw(&canvas), after);
}

#[test]
fn test_empty_stacks_fail_silently() {
    let mut canvas = Canvas::new(4, 4, premultiply(WHITE));
    let mut history = History::default();
    assert!(history.undo(&mut canvas).is_none());
    assert!(history.redo(&mut canvas).is_none());
    assert!(!history.can_undo());
    assert!(!history.can_redo());
}

#[test]
fn test_new_record_clears_redo() {
    let mut canvas = Canvas::new(4, 4, premultiply(WHITE));
    let mut history = History::default();

    history.record_patch(&canvas, Rect::new(0, 0, 1, 1));
    canvas.surface.fill_rect(Rect::new(0, 0, 1, 1), premultiply(RED));
    history.undo(&mut canvas).unwrap();
    assert!(history.can_redo());

    // A fresh user action forgets the future.
    history.record_patch(&canvas, Rect::new(2, 2, 3, 3));
    canvas.surface.fill_rect(Rect::new(2, 2, 3, 3), premultiply(BLUE));
    assert!(!history.can_redo());
    assert_eq!(history.undo_count(), 1);
}

#[test]
fn test_resize_entry_round_trip() {
    let mut canvas = Canvas::new(10, 10, premultiply(WHITE));
    canvas.surface.put(9, 9, premultiply(RED));
    canvas.surface.put(0, 0, premultiply(BLUE));
    let mut history = History::default();
    let before = raw(&canvas);

    // Shrink one axis, grow the other, as a resize entry.
    let old = canvas.resize(15, 8, premultiply(WHITE));
    history.record_resize(old);
    assert_eq!((canvas.width(), canvas.height()), (15, 8));
    // New columns filled with background; old content anchored top-left;
    // rows 8–9 discarded.
    assert_eq!(canvas.surface.get(12, 3), Some(WHITE));
    assert_eq!(canvas.surface.get(0, 0), Some(BLUE));
    assert_eq!(canvas.surface.get(9, 7), Some(WHITE));
    let after = raw(&canvas);

    let damage = history.undo(&mut canvas).expect("undo resize");
    assert_eq!((canvas.width(), canvas.height()), (10, 10));
    assert_eq!(damage, canvas.bounds());
    assert_eq!(raw(&canvas), before);
    assert_eq!(canvas.surface.get(9, 9), Some(RED));

    history.redo(&mut canvas).expect("redo resize");
    assert_eq!((canvas.width(), canvas.height()), (15, 8));
    assert_eq!(raw(&canvas), after);
}

#[test]
fn test_patch_clipped_to_canvas() {
    let mut canvas = Canvas::new(4, 4, premultiply(WHITE));
    let mut history = History::default();

    // An off-canvas rect records nothing.
    history.record_patch(&canvas, Rect::new(10, 10, 20, 20));
    assert!(!history.can_undo());

    // A partially off-canvas rect records the clipped region.
    history.record_patch(&canvas, Rect::new(2, 2, 9, 9));
    canvas.surface.fill_rect(Rect::new(2, 2, 3, 3), premultiply(RED));
    let damage = history.undo(&mut canvas).unwrap();
    assert_eq!(damage, Rect::new(2, 2, 3, 3));
    assert_eq!(canvas.surface.get(3, 3), Some(WHITE));
}

#[test]
fn test_cap_prunes_oldest() {
    let mut canvas = Canvas::new(4, 4, premultiply(WHITE));
    let mut history = History::new(3);
    for _ in 0..5 {
        history.record(HistoryEntry::Patch {
            x: 0,
            y: 0,
            pixels: canvas.surface.snapshot_rect(Rect::new(0, 0, 0, 0)),
        });
    }
    assert_eq!(history.undo_count(), 3);
}

#[test]
fn test_memory_usage_tracks_snapshots() {
    let canvas = Canvas::new(8, 8, premultiply(WHITE));
    let mut history = History::default();
    assert_eq!(history.memory_usage(), 0);
    history.record_patch(&canvas, Rect::new(0, 0, 3, 3));
    assert_eq!(history.memory_usage(), 4 * 4 * 4);
}

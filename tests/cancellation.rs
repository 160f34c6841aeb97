use gatematch::layout::memory::{GateId, MemoryLayer, MemoryLayout};
use gatematch::{
    CompileConfig, GateMatchResult, GateModel, GateTemplate, LayerPosition, LayerType,
    MatchConfig, MatchProgress, Matcher, Orientation, OwnedImage, Rect, SpatialIndex,
    TemplateBank, TemplateId,
};
use std::sync::Arc;
use std::thread;

fn bump(width: usize, height: usize) -> OwnedImage {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let d = (x as f64 - cx).hypot(y as f64 - cy);
            let value = (220.0 - 40.0 * d + 6.0 * x as f64).round().max(0.0);
            data.push(value as u8);
        }
    }
    OwnedImage::new(data, width, height).unwrap()
}

/// 40×16 layer with two separated gates.
fn two_gate_setup() -> (MemoryLayer, Matcher) {
    let tpl = bump(6, 6);
    let width = 40;
    let mut data = vec![0u8; width * 16];
    for px in [5, 25] {
        for y in 0..6 {
            for x in 0..6 {
                data[(5 + y) * width + px + x] = tpl.get(x, y).unwrap();
            }
        }
    }
    let layer = MemoryLayer::new(OwnedImage::new(data, width, 16).unwrap());
    let templates = vec![GateTemplate::from_image(TemplateId(1), "inv", LayerType::Logic, tpl)];
    let bank = TemplateBank::compile(
        &templates,
        &CompileConfig {
            orientations: vec![Orientation::Identity, Orientation::FlipVertical],
            ..CompileConfig::default()
        },
    )
    .unwrap();
    let matcher = Matcher::new(bank).with_config(MatchConfig {
        threshold_hc: 0.3,
        threshold_detection: 0.9,
        max_step: 2,
        ..MatchConfig::default()
    });
    (layer, matcher)
}

/// Layout that requests cancellation as soon as a gate is inserted.
struct CancelOnInsert<'a> {
    inner: MemoryLayout,
    progress: &'a MatchProgress,
}

impl SpatialIndex for CancelOnInsert<'_> {
    fn region_occupied(&self, rect: Rect) -> bool {
        self.inner.region_occupied(rect)
    }

    fn distance_to_occupied_boundary(
        &self,
        x: usize,
        y: usize,
        horizontal: bool,
        width: usize,
        height: usize,
    ) -> usize {
        self.inner
            .distance_to_occupied_boundary(x, y, horizontal, width, height)
    }
}

impl GateModel for CancelOnInsert<'_> {
    type Handle = GateId;

    fn insert_gate(
        &mut self,
        layer: LayerPosition,
        rect: Rect,
        orientation: Orientation,
        template: TemplateId,
    ) -> GateMatchResult<GateId> {
        let id = self.inner.insert_gate(layer, rect, orientation, template)?;
        self.progress.cancel();
        Ok(id)
    }

    fn rebind_ports(&mut self, gate: GateId) -> GateMatchResult<()> {
        self.inner.rebind_ports(gate)
    }
}

#[test]
fn uncancelled_run_places_both_gates() {
    let (layer, matcher) = two_gate_setup();
    let progress = MatchProgress::new();
    let mut layout = MemoryLayout::new();
    let report = matcher
        .run(&layer, &mut layout, layer.bounds(), &progress)
        .unwrap();
    assert_eq!(report.placed.len(), 2);
    assert!(!report.cancelled);
    assert_eq!((progress.done(), progress.total()), (2, 2));
}

#[test]
fn cancelled_before_start_does_nothing() {
    let (layer, matcher) = two_gate_setup();
    let progress = MatchProgress::new();
    progress.cancel();
    let mut layout = MemoryLayout::new();
    let report = matcher
        .run(&layer, &mut layout, layer.bounds(), &progress)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.candidates_scored, 0);
    assert_eq!(report.passes_completed, 0);
    assert!(layout.is_empty());
    assert_eq!(progress.done(), 0);
}

#[test]
fn cancellation_keeps_gates_placed_so_far() {
    let (layer, matcher) = two_gate_setup();
    let progress = MatchProgress::new();
    let mut layout = CancelOnInsert {
        inner: MemoryLayout::new(),
        progress: &progress,
    };
    let report = matcher
        .run(&layer, &mut layout, layer.bounds(), &progress)
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.placed.len(), 1);
    assert_eq!(layout.inner.len(), 1);
    assert_eq!(layout.inner.gates()[0].rect, report.placed[0].rect);
    assert!(progress.fraction() < 1.0);
}

#[test]
fn run_on_worker_thread_reports_progress() {
    let (layer, matcher) = two_gate_setup();
    let progress = Arc::new(MatchProgress::new());
    let report = thread::scope(|scope| {
        let worker = {
            let progress = Arc::clone(&progress);
            let (layer, matcher) = (&layer, &matcher);
            scope.spawn(move || {
                let mut layout = MemoryLayout::new();
                matcher.run(layer, &mut layout, layer.bounds(), &progress)
            })
        };
        while !worker.is_finished() {
            assert!(progress.fraction() <= 1.0);
            thread::yield_now();
        }
        worker.join().unwrap()
    })
    .unwrap();
    assert_eq!(report.placed.len(), 2);
    assert_eq!(progress.fraction(), 1.0);
}

//! Frame driver
//!
//! Owns the field and the only notion of wall-clock time. Each delivered
//! frame runs exactly one tick, updates completion records and builds the
//! scene. Pointer handlers only write the shared pointer value; the tick
//! reads it.

use glam::Vec2;

use crate::config::HeroConfig;
use crate::error::Result;
use crate::platform::{FrameHandle, FrameScheduler};
use crate::renderer::{Scene, SceneStyle, build_scene};
use crate::sim::{CompletionEvent, Field, FieldEvent, GroupId, TickInput, tick};

/// A completion kept on screen while its label is shown
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    pub group: GroupId,
    pub name: String,
    pub centroid: Vec2,
    /// Host timestamp (ms) of the completion
    pub created_at: f64,
}

impl CompletionRecord {
    pub fn from_event(event: &CompletionEvent) -> Self {
        Self {
            group: event.group,
            name: event.name.clone(),
            centroid: event.centroid,
            created_at: event.timestamp,
        }
    }

    pub fn age(&self, now_ms: f64) -> f64 {
        now_ms - self.created_at
    }

    /// Label opacity: 1 when fresh, 0 once `duration_ms` has passed
    pub fn fade(&self, now_ms: f64, duration_ms: f64) -> f32 {
        if duration_ms <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age(now_ms) / duration_ms).clamp(0.0, 1.0) as f32
    }
}

/// Result of one driven frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub scene: Scene,
    pub events: Vec<FieldEvent>,
    /// Total constellations discovered since the driver was created
    pub discovered: u32,
}

type FocalCallback = Box<dyn FnMut()>;
type DiscoveryCallback = Box<dyn FnMut(&CompletionEvent)>;

pub struct Driver<S: FrameScheduler> {
    config: HeroConfig,
    seed: u64,
    field: Field,
    scheduler: S,
    pending: Option<FrameHandle>,
    running: bool,
    pointer: Option<Vec2>,
    pressed: bool,
    records: Vec<CompletionRecord>,
    discovered: u32,
    style: SceneStyle,
    on_focal: Option<FocalCallback>,
    on_discovery: Option<DiscoveryCallback>,
}

impl<S: FrameScheduler> Driver<S> {
    pub fn new(config: HeroConfig, width: f32, height: f32, seed: u64, scheduler: S) -> Result<Self> {
        let field = Field::initialize(&config, width, height, seed)?;
        Ok(Self {
            config,
            seed,
            field,
            scheduler,
            pending: None,
            running: false,
            pointer: None,
            pressed: false,
            records: Vec::new(),
            discovered: 0,
            style: SceneStyle::default(),
            on_focal: None,
            on_discovery: None,
        })
    }

    /// Invoked when the focal graphic is clicked
    pub fn on_focal_click(&mut self, callback: impl FnMut() + 'static) {
        self.on_focal = Some(Box::new(callback));
    }

    /// Invoked once per completed constellation
    pub fn on_discovery(&mut self, callback: impl FnMut(&CompletionEvent) + 'static) {
        self.on_discovery = Some(Box::new(callback));
    }

    pub fn set_style(&mut self, style: SceneStyle) {
        self.style = style;
    }

    /// Begin requesting frames
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = Some(self.scheduler.request_frame());
        log::info!("Driver started ({} entities)", self.field.entities.len());
    }

    /// Cancel the pending frame; frames delivered afterwards are ignored
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        log::info!("Driver stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Rebuild the field for a new surface size, dropping in-flight records
    pub fn resize(&mut self, width: f32, height: f32) -> Result<()> {
        self.field = Field::initialize(&self.config, width, height, self.seed)?;
        self.records.clear();
        log::info!("Field rebuilt for {width}x{height}");
        Ok(())
    }

    /// Run one frame at host time `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameOutput> {
        if !self.running {
            return None;
        }
        self.pending = None;

        let input = TickInput {
            pointer: self.pointer,
            pressed: self.pressed,
            now_ms,
        };
        let events = tick(&mut self.field, &input);

        for event in &events {
            if let FieldEvent::ConstellationCompleted(done) = event {
                self.records.push(CompletionRecord::from_event(done));
                self.discovered += 1;
                if let Some(callback) = self.on_discovery.as_mut() {
                    callback(done);
                }
            }
        }

        let duration = self.field.activation.label_duration_ms;
        self.records.retain(|r| r.age(now_ms) < duration);

        let scene = build_scene(&self.field, self.pointer, &self.records, now_ms, &self.style);
        self.pending = Some(self.scheduler.request_frame());

        Some(FrameOutput {
            scene,
            events,
            discovered: self.discovered,
        })
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer = Some(Vec2::new(x, y));
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.pressed = false;
    }

    pub fn pointer_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Handle a click; returns whether it hit the focal graphic of a running
    /// hero (and so invoked the focal callback)
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        if !self.running || !self.field.focal_contains(Vec2::new(x, y)) {
            return false;
        }
        log::info!("Focal graphic clicked");
        if let Some(callback) = self.on_focal.as_mut() {
            callback();
        }
        true
    }

    pub fn is_hovering_focal(&self) -> bool {
        self.pointer.is_some_and(|p| self.field.focal_contains(p))
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    pub fn discovered(&self) -> u32 {
        self.discovered
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::platform::ManualScheduler;
    use crate::sim::constellation::{Catalog, ConstellationDef};

    fn triangle_config() -> HeroConfig {
        let mut config = HeroConfig::constellation();
        config.catalog = Catalog::new(vec![ConstellationDef::new(
            "Triangle",
            &[[0.1, 0.1], [0.2, 0.1], [0.1, 0.2]],
            &[[0, 1], [1, 2], [2, 0]],
        )])
        .unwrap();
        config.background.count = 10;
        config.activation.radius = 5.0;
        config
    }

    fn driver() -> Driver<ManualScheduler> {
        Driver::new(triangle_config(), 100.0, 100.0, 1, ManualScheduler::new()).unwrap()
    }

    fn discover(driver: &mut Driver<ManualScheduler>, now_ms: f64) -> Vec<FieldEvent> {
        let mut events = Vec::new();
        for (x, y) in [(10.0, 10.0), (20.0, 10.0), (10.0, 20.0)] {
            driver.pointer_moved(x, y);
            events.extend(driver.frame(now_ms).unwrap().events);
        }
        events
    }

    #[test]
    fn test_stop_cancels_pending_frame() {
        let mut d = driver();
        assert!(d.frame(0.0).is_none(), "frames before start are ignored");

        d.start();
        assert!(d.scheduler().pending().is_some());
        assert!(d.frame(16.0).is_some());
        assert!(d.scheduler().pending().is_some());

        d.stop();
        assert!(d.scheduler().pending().is_none());
        assert_eq!(d.scheduler().cancelled, 1);
        assert!(d.frame(32.0).is_none());
        assert_eq!(d.field().time_ticks, 1);
    }

    #[test]
    fn test_start_twice_requests_once() {
        let mut d = driver();
        d.start();
        d.start();
        assert_eq!(d.scheduler().requested, 1);
    }

    #[test]
    fn test_completion_creates_record_and_tally() {
        let mut d = driver();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        d.on_discovery(move |_| counter.set(counter.get() + 1));
        d.start();

        let events = discover(&mut d, 100.0);
        let completed = events
            .iter()
            .filter(|e| matches!(e, FieldEvent::ConstellationCompleted(_)))
            .count();
        assert_eq!(completed, 1);
        assert_eq!(d.discovered(), 1);
        assert_eq!(seen.get(), 1);
        assert_eq!(d.records().len(), 1);
        assert_eq!(d.records()[0].name, "Triangle");
    }

    #[test]
    fn test_records_expire_and_group_resets() {
        let mut d = driver();
        d.start();
        discover(&mut d, 0.0);
        d.pointer_left();

        let out = d.frame(1000.0).unwrap();
        assert_eq!(out.scene.labels.len(), 1);

        let out = d.frame(2600.0).unwrap();
        assert!(d.records().is_empty());
        assert!(out.scene.labels.is_empty());
        assert_eq!(d.field().activated_count(), 3);

        let out = d.frame(3100.0).unwrap();
        assert!(out.events.contains(&FieldEvent::ConstellationReset { group: GroupId(0) }));
        assert_eq!(d.field().activated_count(), 0);

        // Rediscovery counts again
        discover(&mut d, 4000.0);
        assert_eq!(d.discovered(), 2);
    }

    #[test]
    fn test_resize_drops_records() {
        let mut d = driver();
        d.start();
        discover(&mut d, 0.0);
        assert_eq!(d.records().len(), 1);

        d.resize(200.0, 200.0).unwrap();
        assert!(d.records().is_empty());
        assert_eq!(d.field().width, 200.0);
        assert_eq!(d.field().activated_count(), 0);
        assert!(d.resize(0.0, 200.0).is_err());
    }

    #[test]
    fn test_focal_click_invokes_callback() {
        let mut d = Driver::new(HeroConfig::black_hole(), 800.0, 600.0, 3, ManualScheduler::new())
            .unwrap();
        let clicked = Rc::new(Cell::new(false));
        let flag = Rc::clone(&clicked);
        d.on_focal_click(move || flag.set(true));
        d.start();

        assert!(!d.click(10.0, 10.0));
        assert!(!clicked.get());

        d.pointer_moved(400.0, 300.0);
        assert!(d.is_hovering_focal());
        assert!(d.click(400.0, 300.0));
        assert!(clicked.get());

        d.pointer_left();
        assert!(!d.is_hovering_focal());
    }

    #[test]
    fn test_stopped_driver_ignores_focal_clicks() {
        let mut d = Driver::new(HeroConfig::black_hole(), 800.0, 600.0, 3, ManualScheduler::new())
            .unwrap();
        let clicks = Rc::new(Cell::new(0));
        let count = Rc::clone(&clicks);
        d.on_focal_click(move || count.set(count.get() + 1));

        assert!(!d.click(400.0, 300.0), "not started yet");
        d.start();
        assert!(d.click(400.0, 300.0));
        d.stop();
        assert!(!d.click(400.0, 300.0), "clicks during a hand-off are dropped");
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn test_label_fade_is_linear() {
        let r = CompletionRecord {
            group: GroupId(0),
            name: "Lyra".to_string(),
            centroid: Vec2::ZERO,
            created_at: 500.0,
        };
        assert_eq!(r.fade(500.0, 2500.0), 1.0);
        assert!((r.fade(1750.0, 2500.0) - 0.5).abs() < 1e-6);
        assert_eq!(r.fade(3000.0, 2500.0), 0.0);
        assert_eq!(r.fade(9000.0, 2500.0), 0.0);
    }
}

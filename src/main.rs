//! Starfield entry point
//!
//! Handles platform-specific initialization and runs the hero loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_hero {
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use starfield::platform::web::{LabelOverlay, Listeners, RafScheduler, canvas_point, dispatch};
    use starfield::platform::{FrameHandle, FrameScheduler};
    use starfield::renderer::{Scene, SdfRenderState, build_warp_scene};
    use starfield::sim::WarpTransition;
    use starfield::{Driver, HeroConfig, Settings};

    /// Hero instance holding all state
    struct Hero {
        driver: Driver<RafScheduler>,
        render_state: Option<SdfRenderState>,
        overlay: LabelOverlay,
        settings: Settings,
        canvas: HtmlCanvasElement,
        /// Warp frames share the driver's rAF callback
        warp_scheduler: RafScheduler,
        warp: Option<WarpTransition>,
        warp_frame: Option<FrameHandle>,
        /// Set by the focal callback, consumed by the next frame
        warp_requested: Rc<Cell<bool>>,
        seed: u64,
    }

    impl Hero {
        fn frame(&mut self, time: f64) {
            if let Some(warp) = self.warp.as_mut() {
                warp.advance();
                let scene = build_warp_scene(warp);
                let finished = warp.is_finished();
                self.render(&scene, time);
                if finished {
                    self.warp = None;
                    self.warp_frame = None;
                    self.warp_requested.set(false);
                    log::info!("Warp finished");
                    dispatch("starfield:warp-complete", "");
                } else {
                    self.warp_frame = Some(self.warp_scheduler.request_frame());
                }
                return;
            }

            let Some(output) = self.driver.frame(time) else {
                return;
            };
            self.render(&output.scene, time);
            self.overlay.sync(&output.scene.labels);
            self.overlay
                .set_counter(output.discovered, self.settings.show_counter);
            self.update_cursor();

            if self.warp_requested.replace(false) {
                self.begin_warp();
            }
        }

        fn begin_warp(&mut self) {
            self.warp_requested.set(false);
            self.driver.stop();
            self.overlay.clear();
            let (w, h) = self.surface_size();
            self.warp = Some(WarpTransition::new(w, h, self.seed));
            self.warp_frame = Some(self.warp_scheduler.request_frame());
            log::info!("Warp started");
        }

        /// Render a scene
        fn render(&mut self, scene: &Scene, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(scene, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        fn update_cursor(&self) {
            let cursor = if self.driver.is_hovering_focal() {
                "pointer"
            } else {
                "default"
            };
            let _ = self.canvas.style().set_property("cursor", cursor);
        }

        /// Logical surface size in CSS pixels
        fn surface_size(&self) -> (f32, f32) {
            (
                self.canvas.client_width() as f32,
                self.canvas.client_height() as f32,
            )
        }

        fn resize(&mut self) {
            let (w, h) = self.surface_size();
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let (pw, ph) = ((w as f64 * dpr) as u32, (h as f64 * dpr) as u32);
            self.canvas.set_width(pw);
            self.canvas.set_height(ph);
            if let Some(render_state) = self.render_state.as_mut() {
                render_state.resize(pw, ph);
                render_state.set_scale(dpr as f32);
            }
            if let Err(e) = self.driver.resize(w, h) {
                log::warn!("Resize to {w}x{h} skipped: {e}");
            }
            self.overlay.clear();
        }

        fn shutdown(&mut self) {
            self.driver.stop();
            if let Some(handle) = self.warp_frame.take() {
                self.warp_scheduler.cancel_frame(handle);
            }
            self.warp_scheduler.clear_callback();
            self.overlay.clear();
        }
    }

    fn hero_config() -> HeroConfig {
        let window = web_sys::window();
        let variant = window
            .as_ref()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("canvas"))
            .and_then(|c| c.get_attribute("data-hero"))
            .unwrap_or_default();
        match variant.as_str() {
            "black-hole" => HeroConfig::black_hole(),
            "particles" => HeroConfig::particle_field(),
            "interactive" => HeroConfig::interactive(),
            _ => HeroConfig::constellation(),
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Starfield starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let mut config = hero_config();
        settings.apply(&mut config);

        let seed = js_sys::Date::now() as u64;
        let scheduler = RafScheduler::new();
        let mut driver = Driver::new(
            config,
            client_w as f32,
            client_h as f32,
            seed,
            scheduler.clone(),
        )
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
        driver.set_style(settings.scene_style());

        let warp_requested = Rc::new(Cell::new(false));
        {
            let flag = Rc::clone(&warp_requested);
            driver.on_focal_click(move || flag.set(true));
        }
        driver.on_discovery(|event| dispatch("starfield:discovered", &event.name));

        log::info!("Hero initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = SdfRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        render_state.set_start_time(js_sys::Date::now());
        render_state.set_scale(dpr as f32);

        let hero = Rc::new(RefCell::new(Hero {
            driver,
            render_state: Some(render_state),
            overlay: LabelOverlay::new(&document),
            settings,
            canvas: canvas.clone(),
            warp_scheduler: scheduler.clone(),
            warp: None,
            warp_frame: None,
            warp_requested,
            seed,
        }));

        {
            let weak: Weak<RefCell<Hero>> = Rc::downgrade(&hero);
            scheduler.set_callback(move |time: f64| {
                if let Some(hero) = weak.upgrade() {
                    hero.borrow_mut().frame(time);
                }
            });
        }

        let listeners = setup_input_handlers(&canvas, &hero);
        hero.borrow_mut().driver.start();

        // Listeners and the hero live for the page lifetime unless torn down
        install_teardown(hero, listeners);

        log::info!("Starfield running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, hero: &Rc<RefCell<Hero>>) -> Listeners {
        let mut listeners = Listeners::new();
        let target: &web_sys::EventTarget = canvas.as_ref();

        {
            let hero = hero.clone();
            let canvas = canvas.clone();
            listeners.add(target, "mousemove", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = canvas_point(&canvas, event.client_x(), event.client_y());
                    hero.borrow_mut().driver.pointer_moved(x, y);
                }
            });
        }

        {
            let hero = hero.clone();
            listeners.add(target, "mouseleave", move |_| {
                hero.borrow_mut().driver.pointer_left();
            });
        }

        {
            let hero = hero.clone();
            listeners.add(target, "mousedown", move |_| {
                hero.borrow_mut().driver.pointer_pressed(true);
            });
        }

        {
            let hero = hero.clone();
            listeners.add(target, "mouseup", move |_| {
                hero.borrow_mut().driver.pointer_pressed(false);
            });
        }

        {
            let hero = hero.clone();
            let canvas = canvas.clone();
            listeners.add(target, "click", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = canvas_point(&canvas, event.client_x(), event.client_y());
                    hero.borrow_mut().driver.click(x, y);
                }
            });
        }

        // Touch: move and start both place the pointer; start also presses
        for (name, press) in [("touchstart", true), ("touchmove", false)] {
            let hero = hero.clone();
            let canvas = canvas.clone();
            listeners.add(target, name, move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    let (x, y) = canvas_point(&canvas, touch.client_x(), touch.client_y());
                    let mut h = hero.borrow_mut();
                    h.driver.pointer_moved(x, y);
                    if press {
                        h.driver.pointer_pressed(true);
                    }
                }
            });
        }

        {
            let hero = hero.clone();
            listeners.add(target, "touchend", move |_| {
                hero.borrow_mut().driver.pointer_left();
            });
        }

        if let Some(window) = web_sys::window() {
            let hero = hero.clone();
            listeners.add(window.as_ref(), "resize", move |_| {
                hero.borrow_mut().resize();
            });
        }

        // Pause while the tab is hidden
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let hero = hero.clone();
            let doc = document.clone();
            listeners.add(document.as_ref(), "visibilitychange", move |_| {
                let mut h = hero.borrow_mut();
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    h.driver.stop();
                } else if h.warp.is_none() {
                    h.driver.start();
                }
            });
        }

        listeners
    }

    /// Stop everything when the page asks for it (`starfield:stop` event)
    fn install_teardown(hero: Rc<RefCell<Hero>>, listeners: Listeners) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let state = Rc::new(RefCell::new(Some((hero, listeners))));
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            if let Some((hero, mut listeners)) = state.borrow_mut().take() {
                hero.borrow_mut().shutdown();
                listeners.remove_all();
                log::info!("Starfield stopped");
            }
        });
        let _ = window
            .add_event_listener_with_callback("starfield:stop", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_hero::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Starfield (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    if let Err(e) = headless_demo() {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Sweep a pointer across every constellation and report discoveries
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo() -> starfield::Result<()> {
    use starfield::platform::ManualScheduler;
    use starfield::sim::FieldEvent;
    use starfield::{Driver, HeroConfig};

    let config = match std::env::args().nth(1).as_deref() {
        Some(path) => HeroConfig::from_json(&std::fs::read_to_string(path).map_err(|e| {
            starfield::StarfieldError::config(format!("reading {path}: {e}"))
        })?)?,
        None => HeroConfig::constellation(),
    };

    let (width, height) = (1280.0, 720.0);
    let mut driver = Driver::new(config, width, height, 42, ManualScheduler::new())?;
    driver.on_discovery(|event| {
        println!(
            "Discovered {} at ({:.0}, {:.0})",
            event.name, event.centroid.x, event.centroid.y
        );
    });
    driver.start();

    let targets: Vec<_> = driver
        .field()
        .entities
        .iter()
        .filter(|e| e.is_member())
        .map(|e| e.pos)
        .collect();

    let mut now = 0.0;
    let mut activated = 0;
    for pos in targets {
        driver.pointer_moved(pos.x, pos.y);
        if let Some(output) = driver.frame(now) {
            activated += output
                .events
                .iter()
                .filter(|e| matches!(e, FieldEvent::StarActivated { .. }))
                .count();
        }
        now += 16.0;
    }
    driver.stop();

    println!(
        "{} stars activated, {} constellations discovered",
        activated,
        driver.discovered()
    );
    Ok(())
}

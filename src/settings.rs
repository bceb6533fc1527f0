//! User settings and preferences
//!
//! Persisted in LocalStorage, separate from any hero config.

use serde::{Deserialize, Serialize};

use crate::config::{HeroConfig, Span};
use crate::renderer::SceneStyle;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Multiplier on background star and particle counts
    pub fn density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }

    /// Whether to render star halos and sparkle rays
    pub fn glow_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }

    /// Whether to render particle mesh lines
    pub fn mesh_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// User settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Overlays ===
    /// Show constellation names on discovery
    pub show_labels: bool,
    /// Show the discovered-constellations counter
    pub show_counter: bool,
    /// Soft glow under the pointer
    pub cursor_glow: bool,

    // === Accessibility ===
    /// Reduced motion (no twinkle, no particle drift)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            show_labels: true,
            show_counter: true,
            cursor_glow: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops the pointer glow for performance
        if preset == QualityPreset::Low {
            self.cursor_glow = false;
        }
    }

    /// Scale counts and strip motion from a hero config
    pub fn apply(&self, config: &mut HeroConfig) {
        let density = self.quality.density();
        config.background.count = (config.background.count as f32 * density).round() as usize;
        if let Some(p) = config.particles.as_mut() {
            p.count = (p.count as f32 * density).round() as usize;
            if self.reduced_motion {
                p.drift = 0.0;
            }
        }

        if let Some(disk) = config.disk.as_mut() {
            disk.count = (disk.count as f32 * density).round() as usize;
            if self.reduced_motion {
                disk.spin = 0.0;
            }
        }

        if self.reduced_motion {
            config.member_style.twinkle_speed = Span::fixed(0.0);
            config.background.style.twinkle_speed = Span::fixed(0.0);
        }
    }

    /// Renderer toggles for these settings
    pub fn scene_style(&self) -> SceneStyle {
        SceneStyle {
            labels: self.show_labels,
            cursor_glow: self.cursor_glow,
            star_rays: self.quality.glow_enabled(),
            star_halos: self.quality.glow_enabled(),
            particle_links: self.quality.mesh_enabled(),
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "starfield_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

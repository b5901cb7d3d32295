//! Player settings and preferences
//!
//! Persisted in LocalStorage on the web build.

use serde::{Deserialize, Serialize};

/// Player settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Input ===
    /// Mirror the camera horizontally so the cursor follows the hand
    pub mirror_input: bool,

    // === Visual Effects ===
    /// Blade trail behind the fingertip
    pub trails: bool,
    /// Juice particle bursts
    pub particles: bool,
    /// Screen shake on bomb contact
    pub screen_shake: bool,
    /// Red flash on bomb contact
    pub flash: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // A selfie camera feed reads backwards without the flip
            mirror_input: true,

            // Visual effects - all on by default
            trails: true,
            particles: true,
            screen_shake: true,
            flash: true,

            // HUD
            show_fps: true,

            // Accessibility
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective bomb flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.flash && !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "fruit_slash_settings";

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

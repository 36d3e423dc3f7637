//! glcd Skin
//!
//! Loads XML skins for small LCD and VFD displays and renders their
//! displays onto any [`Surface`](render::Surface).
//!
//! # Example
//! ```rust,ignore
//! use glcd_skin::{SkinLoader, render::Canvas};
//!
//! let mut skin = SkinLoader::new(host).load("skins/default/default.skin")?;
//! let mut canvas = Canvas::new(128, 64);
//! if skin.needs_update("normal", now) {
//!     skin.render("normal", &mut canvas)?;
//! }
//! ```

mod builder;
mod context;
mod display;
mod error;
mod host;
mod options;
mod skin;

pub use context::SkinContext;
pub use display::Display;
pub use error::{LoadError, SkinError};
pub use host::SkinHost;
pub use options::SkinOptions;
pub use skin::{SUPPORTED_VERSION, Skin, SkinLoader};

// Re-export sub-crates for hosts and custom loaders
pub use glcd_expr as expr;
pub use glcd_render as render;
pub use glcd_xml as xml;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

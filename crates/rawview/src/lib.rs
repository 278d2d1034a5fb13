#![doc = include_str!("../README.md")]

pub use rawview_codec as codec;
pub use rawview_core as core;

pub use thiserror;

pub mod session;
pub mod settings;

pub mod prelude {
    pub use crate::session::{NavigationState, PlaybackTick, Refresh, Session};
    pub use crate::settings::{SettingsError, ViewerSettings};
    pub use rawview_codec::prelude::*;
    #[allow(unused_imports)]
    pub use rawview_core::prelude::*;
}

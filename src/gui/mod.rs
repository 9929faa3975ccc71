//! GUI module for the MarkDrop egui popup
//!
//! This module contains all UI components for the native desktop popup.

pub mod app;
pub mod state;
pub mod views;
pub mod widgets;

pub use app::MarkDropApp;
pub use state::{FormAction, Selection, Toast, ToastType, View};

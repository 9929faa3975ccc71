//! Reusable widget components for the egui popup

pub mod toast;

//! User interface subsystem - status output on the SSD1306 OLED.
//!
//! The screen content is composed by `blesim::ui::status`; this module
//! only puts it on the panel.

pub mod display;

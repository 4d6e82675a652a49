use crate::job::{NoticeLevel, RiskLevel};
use eframe::egui::Color32;

pub const ACCENT: Color32 = Color32::from_rgb(74, 144, 226);
pub const SUCCESS: Color32 = Color32::from_rgb(40, 167, 69);
pub const WARNING: Color32 = Color32::from_rgb(255, 193, 7);
pub const DANGER: Color32 = Color32::from_rgb(220, 53, 69);
pub const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

pub trait LevelColor {
    fn color(&self) -> Color32;
}

impl LevelColor for NoticeLevel {
    fn color(&self) -> Color32 {
        match self {
            NoticeLevel::Success => SUCCESS,
            NoticeLevel::Info => ACCENT,
            NoticeLevel::Warning => WARNING,
            NoticeLevel::Error => DANGER,
        }
    }
}

impl LevelColor for RiskLevel {
    fn color(&self) -> Color32 {
        match self {
            RiskLevel::Low => SUCCESS,
            RiskLevel::Medium => WARNING,
            RiskLevel::High => DANGER,
        }
    }
}

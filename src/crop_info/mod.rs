//! Persisted crop record stored as a JSON attribute on the image node.

use serde::{Deserialize, Serialize};

use crate::host::{HostEditor, HostResult, NodeId};

pub const CROP_INFO_ATTRIBUTE: &str = "data-crop-info";

/// Fractions of the uncropped bitmap trimmed from each edge, plus the source
/// of that uncropped bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropInfo {
    pub src: String,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl CropInfo {
    pub fn uncropped(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0 && self.top == 0.0 && self.bottom == 0.0
    }

    /// Each fraction in `[0, 1)` with opposite edges leaving a visible band.
    pub fn is_valid(&self) -> bool {
        let in_range = |value: f64| (0.0..1.0).contains(&value);
        in_range(self.left)
            && in_range(self.right)
            && in_range(self.top)
            && in_range(self.bottom)
            && self.left + self.right < 1.0
            && self.top + self.bottom < 1.0
    }

    pub fn visible_width_fraction(&self) -> f64 {
        1.0 - self.left - self.right
    }

    pub fn visible_height_fraction(&self) -> f64 {
        1.0 - self.top - self.bottom
    }
}

pub fn encode(info: &CropInfo) -> String {
    serde_json::json!({
        "src": info.src,
        "left": info.left,
        "right": info.right,
        "top": info.top,
        "bottom": info.bottom,
    })
    .to_string()
}

/// Parses a stored record. Missing, unparsable or out-of-range input yields
/// the zero crop anchored to `current_src`.
pub fn decode(raw: Option<&str>, current_src: &str) -> CropInfo {
    raw.and_then(|raw| serde_json::from_str::<CropInfo>(raw).ok())
        .filter(|info| !info.src.is_empty() && info.is_valid())
        .unwrap_or_else(|| CropInfo::uncropped(current_src))
}

pub fn extract<H: HostEditor>(host: &H, image: NodeId) -> CropInfo {
    let raw = host.attribute(image, CROP_INFO_ATTRIBUTE);
    decode(raw.as_deref(), &host.source(image))
}

/// Writes the record, or removes the attribute when nothing is trimmed.
pub fn store<H: HostEditor>(host: &mut H, image: NodeId, info: &CropInfo) -> HostResult<()> {
    if info.is_zero() {
        remove(host, image)
    } else {
        host.set_attribute(image, CROP_INFO_ATTRIBUTE, &encode(info))
    }
}

pub fn remove<H: HostEditor>(host: &mut H, image: NodeId) -> HostResult<()> {
    host.remove_attribute(image, CROP_INFO_ATTRIBUTE)
}

// Derived device metrics (screen, storage)

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::property::DeviceProperties;

/// Physical size that renders at a different logical size than
/// `physical / scale` (iPhone 6/6s/7/8 Plus family).
const DOWNSAMPLED_PHYSICAL: (i64, i64) = (1080, 1920);
const DOWNSAMPLED_POINTS: Points = Points {
    width: 414,
    height: 736,
};

/// Free-percentage denominator offset, kept for compatibility with existing
/// consumers of this number.
const FREE_PERCENT_DENOMINATOR_OFFSET: f64 = 2.0;

/// Logical resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub width: i64,
    pub height: i64,
}

/// Screen metrics from the `com.apple.mobile.iTunes` domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDetails {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub scale: Option<i64>,
    pub points: Option<Points>,
}

impl ScreenDetails {
    pub fn from_properties(props: &DeviceProperties) -> Result<Self> {
        let width = props.base10_integer("ScreenWidth")?;
        let height = props.base10_integer("ScreenHeight")?;
        let scale = props.base10_integer("ScreenScaleFactor")?;
        let points = match (width, height, scale) {
            (Some(w), Some(h), Some(s)) => compute_points(w, h, s),
            _ => None,
        };
        Ok(Self {
            width,
            height,
            scale,
            points,
        })
    }
}

/// `floor(physical / scale)` per axis, with the downsampled-panel override
pub fn compute_points(width: i64, height: i64, scale: i64) -> Option<Points> {
    if (width, height) == DOWNSAMPLED_PHYSICAL {
        return Some(DOWNSAMPLED_POINTS);
    }
    if scale == 0 {
        return None;
    }
    Some(Points {
        width: floor_div(width, scale)?,
        height: floor_div(height, scale)?,
    })
}

/// Division rounded toward negative infinity; `None` on overflow or zero divisor
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Storage metrics from the `com.apple.disk_usage` domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDetails {
    pub size: Option<i64>,
    pub used: Option<i64>,
    pub free: Option<i64>,
    pub free_percent: Option<f64>,
}

impl StorageDetails {
    pub fn from_properties(props: &DeviceProperties) -> Result<Self> {
        let size = props.integer("TotalDataCapacity")?;
        let free = props.integer("TotalDataAvailable")?;
        Ok(Self::compute(size, free))
    }

    pub fn compute(size: Option<i64>, free: Option<i64>) -> Self {
        let (used, free_percent) = match (size, free) {
            (Some(size), Some(free)) => (
                size.checked_sub(free),
                Some(free_percent(size, free)),
            ),
            _ => (None, None),
        };
        Self {
            size,
            used,
            free,
            free_percent,
        }
    }
}

/// `free * 100 / (size + 2)` in double precision, evaluated in that order
pub fn free_percent(size: i64, free: i64) -> f64 {
    (free as f64 * 100.0) / (size as f64 + FREE_PERCENT_DENOMINATOR_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyValue;
    use std::collections::BTreeMap;

    fn screen(w: PropertyValue, h: PropertyValue, s: PropertyValue) -> DeviceProperties {
        let mut map = BTreeMap::new();
        map.insert("ScreenWidth".to_string(), w);
        map.insert("ScreenHeight".to_string(), h);
        map.insert("ScreenScaleFactor".to_string(), s);
        map.into()
    }

    #[test]
    fn test_points_override_for_downsampled_panel() {
        let details = ScreenDetails::from_properties(&screen(
            PropertyValue::Integer(1080),
            PropertyValue::Integer(1920),
            PropertyValue::Integer(3),
        ))
        .unwrap();
        assert_eq!(
            details.points,
            Some(Points {
                width: 414,
                height: 736
            })
        );
    }

    #[test]
    fn test_points_floor_division() {
        let details = ScreenDetails::from_properties(&screen(
            PropertyValue::Integer(750),
            PropertyValue::Integer(1334),
            PropertyValue::Integer(2),
        ))
        .unwrap();
        assert_eq!(details.width, Some(750));
        assert_eq!(details.scale, Some(2));
        assert_eq!(
            details.points,
            Some(Points {
                width: 375,
                height: 667
            })
        );
    }

    #[test]
    fn test_points_from_string_fields() {
        let details = ScreenDetails::from_properties(&screen(
            PropertyValue::String("1125".into()),
            PropertyValue::String("2436".into()),
            PropertyValue::String("3".into()),
        ))
        .unwrap();
        assert_eq!(
            details.points,
            Some(Points {
                width: 375,
                height: 812
            })
        );
    }

    #[test]
    fn test_missing_screen_fields_are_unavailable() {
        let details = ScreenDetails::from_properties(&DeviceProperties::default()).unwrap();
        assert_eq!(details.width, None);
        assert_eq!(details.points, None);
    }

    #[test]
    fn test_zero_scale_has_no_points() {
        assert_eq!(compute_points(640, 1136, 0), None);
    }

    #[test]
    fn test_storage_keeps_offset_denominator() {
        let storage = StorageDetails::compute(Some(1000), Some(500));
        assert_eq!(storage.used, Some(500));
        assert_eq!(storage.free_percent, Some(500.0 * 100.0 / 1002.0));
        assert!((storage.free_percent.unwrap() - 49.900_199_600_798_4).abs() < 1e-12);
    }

    #[test]
    fn test_points_round_toward_negative_infinity() {
        assert_eq!(
            compute_points(751, 1335, -2),
            Some(Points {
                width: -376,
                height: -668
            })
        );
        assert_eq!(
            compute_points(-751, 1334, 2),
            Some(Points {
                width: -376,
                height: 667
            })
        );
        assert_eq!(compute_points(i64::MIN, 100, -1), None);
    }

    #[test]
    fn test_storage_used_overflow_is_unavailable() {
        let storage = StorageDetails::compute(Some(i64::MIN), Some(1));
        assert_eq!(storage.used, None);
        assert_eq!(storage.size, Some(i64::MIN));
    }

    #[test]
    fn test_storage_missing_field() {
        let storage = StorageDetails::compute(Some(1000), None);
        assert_eq!(storage.size, Some(1000));
        assert_eq!(storage.used, None);
        assert_eq!(storage.free_percent, None);
    }
}

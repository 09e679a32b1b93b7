//! Device emulation profiles.

use serde::Serialize;

/// Viewport and user agent of an emulated device.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub width: i64,
    pub height: i64,
    pub scale: f64,
    pub mobile: bool,
    pub touch: bool,
    pub landscape: bool,
    pub user_agent: &'static str,
}

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";
const IPHONE_LEGACY_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 Mobile/15A372 Safari/604.1";
const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 11_0 like Mac OS X) AppleWebKit/604.1.34 (KHTML, like Gecko) Version/11.0 Mobile/15A5341f Safari/604.1";
const PIXEL_UA: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const PIXEL2_UA: &str = "Mozilla/5.0 (Linux; Android 8.0; Pixel 2 Build/OPD3.170816.012) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const GALAXY_UA: &str = "Mozilla/5.0 (Linux; Android 5.0; SM-G900P Build/LRX21T) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const NEXUS_UA: &str = "Mozilla/5.0 (Linux; Android 8.0.0; Nexus 5X Build/OPR4.170623.006) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const MOTO_UA: &str = "Mozilla/5.0 (Linux; Android 7.0; Moto G (4)) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

macro_rules! device {
    ($name:expr, $w:expr, $h:expr, $scale:expr, $landscape:expr, $ua:expr) => {
        DeviceProfile {
            name: $name,
            width: $w,
            height: $h,
            scale: $scale,
            mobile: true,
            touch: true,
            landscape: $landscape,
            user_agent: $ua,
        }
    };
}

static DEVICES: &[DeviceProfile] = &[
    device!("iPhone 6", 375, 667, 2.0, false, IPHONE_LEGACY_UA),
    device!("iPhone 6 landscape", 667, 375, 2.0, true, IPHONE_LEGACY_UA),
    device!("iPhone 6 Plus", 414, 736, 3.0, false, IPHONE_LEGACY_UA),
    device!("iPhone 6 Plus landscape", 736, 414, 3.0, true, IPHONE_LEGACY_UA),
    device!("iPhone X", 375, 812, 3.0, false, IPHONE_LEGACY_UA),
    device!("iPhone X landscape", 812, 375, 3.0, true, IPHONE_LEGACY_UA),
    device!("iPhone 12 Pro", 390, 844, 3.0, false, IPHONE_UA),
    device!("iPhone 12 Pro landscape", 844, 390, 3.0, true, IPHONE_UA),
    device!("iPhone 14 Pro Max", 430, 932, 3.0, false, IPHONE_UA),
    device!("iPad", 768, 1024, 2.0, false, IPAD_UA),
    device!("iPad landscape", 1024, 768, 2.0, true, IPAD_UA),
    device!("iPad Pro", 1024, 1366, 2.0, false, IPAD_UA),
    device!("iPad Pro landscape", 1366, 1024, 2.0, true, IPAD_UA),
    device!("Galaxy S5", 360, 640, 3.0, false, GALAXY_UA),
    device!("Galaxy S5 landscape", 640, 360, 3.0, true, GALAXY_UA),
    device!("Moto G4", 360, 640, 3.0, false, MOTO_UA),
    device!("Moto G4 landscape", 640, 360, 3.0, true, MOTO_UA),
    device!("Nexus 5X", 412, 732, 2.625, false, NEXUS_UA),
    device!("Nexus 5X landscape", 732, 412, 2.625, true, NEXUS_UA),
    device!("Pixel 2", 411, 731, 2.625, false, PIXEL2_UA),
    device!("Pixel 2 (XL)", 411, 823, 3.5, false, PIXEL2_UA),
    device!("Pixel 5", 393, 851, 2.75, false, PIXEL_UA),
    device!("Pixel 5 landscape", 851, 393, 2.75, true, PIXEL_UA),
];

/// Derive the lookup id of a device name: spaces and `)` removed,
/// `(` becomes `_`, `+` becomes `plus`.
pub fn device_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    for ch in name.chars() {
        match ch {
            ' ' | ')' => {}
            '(' => id.push('_'),
            '+' => id.push_str("plus"),
            other => id.push(other),
        }
    }
    id
}

impl DeviceProfile {
    pub fn id(&self) -> String {
        device_id(self.name)
    }

    pub fn all() -> &'static [DeviceProfile] {
        DEVICES
    }

    /// Exact id lookup.
    pub fn find(id: &str) -> Option<&'static DeviceProfile> {
        DEVICES.iter().find(|device| device.id() == id)
    }

    /// Every known id, sorted.
    pub fn ids() -> Vec<String> {
        let mut ids: Vec<String> = DEVICES.iter().map(DeviceProfile::id).collect();
        ids.sort();
        ids
    }
}

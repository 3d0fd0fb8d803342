//! Startup configuration for the globe.
//!
//! Everything the viewer needs to know before the first frame lives here: the
//! list of regions to load, where to find them, the globe and camera geometry,
//! and how outlines are assembled. Defaults reproduce the stock world view.
//!
//! On the web, defaults can be overridden from the URL query string
//! (`?regions=USA,CAN&speed=0.002`). Natively, an optional `globe.json` in the
//! working directory is read instead.

use crate::geo::{MalformedRingPolicy, SegmentMode};
use serde::{Deserialize, Serialize};

/// ISO 3166-1 alpha-3 codes of the countries shipped under `countries/`.
pub const DEFAULT_REGIONS: &[&str] = &[
    "AFG", "ALB", "DZA", "AGO", "ARG", "ARM", "AUS", "AUT", "AZE", "BHS", "BGD", "BLR", "BEL",
    "BLZ", "BEN", "BTN", "BOL", "BIH", "BWA", "BRA", "BRN", "BGR", "BFA", "BDI", "KHM", "CMR",
    "CAN", "CAF", "TCD", "CHL", "CHN", "COL", "COG", "COD", "CRI", "HRV", "CUB", "CYP", "CZE",
    "DNK", "DJI", "DOM", "ECU", "EGY", "SLV", "GNQ", "ERI", "EST", "ETH", "FLK", "FJI", "FIN",
    "FRA", "GUF", "ATF", "GAB", "GMB", "GEO", "DEU", "GHA", "GRC", "GTM", "GIN", "GNB", "GUY",
    "HTI", "HND", "HUN", "ISL", "IND", "IDN", "IRN", "IRQ", "IRL", "ISR", "ITA", "JAM", "JPN",
    "JOR", "KAZ", "KEN", "KOR", "KWT", "KGZ", "LAO", "LVA", "LBN", "LSO", "LBR", "LBY", "LTU",
    "LUX", "MKD", "MDG", "MWI", "MYS", "MLI", "MLT", "MRT", "MEX", "MDA", "MNG", "MNE", "MAR",
    "MOZ", "MMR", "NAM", "NPL", "NLD", "NCL", "NZL", "NIC", "NER", "NGA", "NOR", "OMN", "PAK",
    "PSE", "PAN", "PNG", "PRY", "PER", "PHL", "POL", "PRT", "PRI", "QAT", "ROU", "RUS", "RWA",
    "SAU", "SEN", "SLE", "SVK", "SVN", "SLB", "SOM", "ZAF", "SSD", "ESP", "LKA", "SDN", "SUR",
    "SWZ", "SWE", "CHE", "SYR", "TWN", "TJK", "TZA", "THA", "TLS", "TGO", "TTO", "TUN", "TUR",
    "TKM", "UGA", "UKR", "ARE", "GBR", "USA", "URY", "UZB", "VUT", "VEN", "VNM", "YEM", "ZMB",
    "ZWE", "CYM",
];

/// Camera placement and perspective parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Distance from the globe center along +Z
    pub distance: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 10.0,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Root configuration supplied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Region identifiers, loaded in this order.
    pub regions: Vec<String>,
    /// Resource path for one region; `{id}` is replaced by the identifier.
    pub path_template: String,
    /// Directory that relative resource paths resolve against (native only).
    pub asset_root: String,
    /// Globe radius in scene units.
    pub radius: f64,
    /// Sphere tessellation around the equator.
    pub width_segments: u32,
    /// Sphere tessellation from pole to pole.
    pub height_segments: u32,
    pub camera: CameraSettings,
    /// Rotation about the Y axis applied once per frame, in radians.
    pub rotation_per_frame: f32,
    /// Stop animating after this many frames (None = run until exit).
    pub max_frames: Option<u64>,
    /// Rotate outlines together with the sphere.
    pub spin_outlines: bool,
    pub globe_color: [u8; 3],
    pub outline_color: [u8; 3],
    pub segment_mode: SegmentMode,
    pub malformed_rings: MalformedRingPolicy,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect(),
            path_template: "countries/{id}.geo.json".to_string(),
            asset_root: ".".to_string(),
            radius: 5.0,
            width_segments: 32,
            height_segments: 32,
            camera: CameraSettings::default(),
            rotation_per_frame: 0.001,
            max_frames: None,
            spin_outlines: true,
            globe_color: [0x00, 0x77, 0xff],
            outline_color: [0xff, 0xff, 0xff],
            segment_mode: SegmentMode::default(),
            malformed_rings: MalformedRingPolicy::default(),
        }
    }
}

impl GlobeConfig {
    /// Native config file name, looked up in the working directory.
    #[cfg(not(target_arch = "wasm32"))]
    const CONFIG_FILE: &'static str = "globe.json";

    /// Resource path for a region identifier.
    pub fn region_path(&self, id: &str) -> String {
        self.path_template.replace("{id}", id)
    }

    /// Parses a (possibly partial) JSON configuration, filling in defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads the configuration from the URL query string.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let mut config = Self::default();

        let search = web_sys::window().and_then(|w| w.location().search().ok());
        if let Some(search) = search {
            config.apply_query(&search);
        }

        config
    }

    /// Loads the configuration from `globe.json`, falling back to defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let json = match std::fs::read_to_string(Self::CONFIG_FILE) {
            Ok(json) => json,
            Err(_) => return Self::default(),
        };

        match Self::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", Self::CONFIG_FILE);
                config
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}", Self::CONFIG_FILE, e);
                Self::default()
            }
        }
    }

    /// Applies overrides from a URL query string (leading `?` optional).
    ///
    /// Recognized keys: `regions` (comma-separated), `speed`, `frames`,
    /// `mode` (`closed` or `open`). Values are percent-decoded, so
    /// `regions=USA%2CCAN` lists two regions. Unknown keys and unparsable
    /// values are ignored.
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        if query.is_empty() {
            return;
        }

        for pair in query.split('&') {
            let mut kv = pair.splitn(2, '=');
            let key = kv.next().unwrap_or("");
            let value = match urlencoding::decode(kv.next().unwrap_or("")) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Ignoring undecodable URL parameter {}: {}", key, e);
                    continue;
                }
            };
            let value: &str = &value;
            match key {
                "regions" => {
                    let regions: Vec<String> = value
                        .split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect();
                    if !regions.is_empty() {
                        self.regions = regions;
                    }
                }
                "speed" => {
                    if let Ok(speed) = value.parse() {
                        self.rotation_per_frame = speed;
                    }
                }
                "frames" => self.max_frames = value.parse().ok(),
                "mode" => match value {
                    "closed" => self.segment_mode = SegmentMode::Closed,
                    "open" => self.segment_mode = SegmentMode::OpenChain,
                    _ => log::warn!("Unknown segment mode in URL: {}", value),
                },
                _ => {}
            }
        }
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four UK nations a constituency can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    England,
    Wales,
    Scotland,
    #[serde(rename = "Northern Ireland")]
    NorthernIreland,
}

lazy_static! {
    // Checked in order; anything that matches none of these is Northern Ireland.
    static ref REGION_PATTERNS: Vec<(Regex, Region)> = vec![
        (Regex::new("E14").unwrap(), Region::England),
        (Regex::new("W07").unwrap(), Region::Wales),
        (Regex::new("S14").unwrap(), Region::Scotland),
    ];
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::England,
        Region::Wales,
        Region::Scotland,
        Region::NorthernIreland,
    ];

    /// Classify a GSS constituency code (e.g. `E14000530`, or a post id like
    /// `gss:S14000021`) by the nation prefix it contains.
    ///
    /// Northern Ireland is a fallback rather than a positive match: any code
    /// without an English, Welsh or Scottish prefix lands there.
    pub fn classify(geographic_code: &str) -> Region {
        REGION_PATTERNS
            .iter()
            .find(|(pattern, _)| pattern.is_match(geographic_code))
            .map(|(_, region)| *region)
            .unwrap_or(Region::NorthernIreland)
    }

    /// Short lowercase identifier used for CLI values and output file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Region::England => "england",
            Region::Wales => "wales",
            Region::Scotland => "scotland",
            Region::NorthernIreland => "northern-ireland",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::England => write!(f, "England"),
            Region::Wales => write!(f, "Wales"),
            Region::Scotland => write!(f, "Scotland"),
            Region::NorthernIreland => write!(f, "Northern Ireland"),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        Region::ALL
            .iter()
            .find(|region| region.slug() == normalized)
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown region '{}' (expected one of: england, wales, scotland, northern-ireland)",
                    s
                )
            })
    }
}

//! FFmpeg filter-graph builders.
//!
//! Every builder validates its parameters and returns the filter string,
//! or `MediaError::InvalidParameter`. Builders producing a single filter can
//! be joined with [`chain`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// Join filters into a linear chain.
pub fn chain<I, S>(filters: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    filters
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> MediaResult<()> {
    if cond {
        Ok(())
    } else {
        Err(MediaError::invalid_parameter(msg()))
    }
}

/// Format a coefficient without trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Keep the segment `[start, end)` (seconds) and reset timestamps.
pub fn trim(start: f64, end: f64) -> MediaResult<String> {
    ensure(start.is_finite() && end.is_finite(), || "trim bounds must be finite".into())?;
    ensure(start >= 0.0, || format!("trim start must be >= 0, got {start}"))?;
    ensure(end > start, || format!("trim end ({end}) must be after start ({start})"))?;
    Ok(format!("trim=start={}:end={},setpts=PTS-STARTPTS", num(start), num(end)))
}

/// Crop a `width`x`height` region at (`x`, `y`).
pub fn crop(width: u32, height: u32, x: u32, y: u32) -> MediaResult<String> {
    ensure(width > 0 && height > 0, || {
        format!("crop size must be positive, got {width}x{height}")
    })?;
    Ok(format!("crop={width}:{height}:{x}:{y}"))
}

/// Rotate clockwise by `degrees`.
///
/// Right angles use lossless transposes; other angles rotate with the
/// canvas grown to fit.
pub fn rotate(degrees: f64) -> MediaResult<String> {
    ensure(degrees.is_finite(), || "rotation must be finite".into())?;
    let normalized = degrees.rem_euclid(360.0);

    let filter = if normalized == 0.0 {
        "null".to_string()
    } else if normalized == 90.0 {
        "transpose=1".to_string()
    } else if normalized == 180.0 {
        "hflip,vflip".to_string()
    } else if normalized == 270.0 {
        "transpose=2".to_string()
    } else {
        let rad = num(normalized.to_radians());
        format!("rotate={rad}:ow=rotw({rad}):oh=roth({rad})")
    };
    Ok(filter)
}

/// Look presets with a 0-100 intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPreset {
    Grayscale,
    Sepia,
    Vintage,
    Blur,
    Sharpen,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 5] = [
        FilterPreset::Grayscale,
        FilterPreset::Sepia,
        FilterPreset::Vintage,
        FilterPreset::Blur,
        FilterPreset::Sharpen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPreset::Grayscale => "grayscale",
            FilterPreset::Sepia => "sepia",
            FilterPreset::Vintage => "vintage",
            FilterPreset::Blur => "blur",
            FilterPreset::Sharpen => "sharpen",
        }
    }

    /// Filter for this preset at `intensity` (0-100).
    ///
    /// Intensity maps linearly onto the filter's coefficient range: 0 is the
    /// identity, 100 the strongest setting.
    pub fn build(&self, intensity: u8) -> MediaResult<String> {
        ensure(intensity <= 100, || format!("intensity must be 0-100, got {intensity}"))?;
        let t = f64::from(intensity) / 100.0;

        Ok(match self {
            FilterPreset::Grayscale => format!("hue=s={}", num(1.0 - t)),
            FilterPreset::Sepia => mixer(&SEPIA, t),
            FilterPreset::Vintage => format!(
                "{},eq=contrast={}:saturation={},vignette=angle={}",
                mixer(&VINTAGE, t),
                num(1.0 - 0.15 * t),
                num(1.0 - 0.3 * t),
                num(std::f64::consts::FRAC_PI_4 * t)
            ),
            FilterPreset::Blur => format!("gblur=sigma={}", num(MAX_BLUR_SIGMA * t)),
            FilterPreset::Sharpen => {
                format!("unsharp=5:5:{}:5:5:0", num(MAX_SHARPEN_AMOUNT * t))
            }
        })
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterPreset {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MediaError::invalid_parameter(format!("unknown filter preset: {s}")))
    }
}

const MAX_BLUR_SIGMA: f64 = 10.0;
const MAX_SHARPEN_AMOUNT: f64 = 1.5;

const IDENTITY: [f64; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
const SEPIA: [f64; 9] = [0.393, 0.769, 0.189, 0.349, 0.686, 0.168, 0.272, 0.534, 0.131];
const VINTAGE: [f64; 9] = [0.9, 0.5, 0.1, 0.3, 0.8, 0.1, 0.2, 0.3, 0.5];

/// `colorchannelmixer` interpolated between identity and `target`.
fn mixer(target: &[f64; 9], t: f64) -> String {
    const KEYS: [&str; 9] = ["rr", "rg", "rb", "gr", "gg", "gb", "br", "bg", "bb"];
    let parts: Vec<String> = KEYS
        .iter()
        .zip(IDENTITY.iter().zip(target.iter()))
        .map(|(k, (from, to))| format!("{k}={}", num(from + (to - from) * t)))
        .collect();
    format!("colorchannelmixer={}", parts.join(":"))
}

/// Color correction in UI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorCorrection {
    /// -100..=100
    pub brightness: i32,
    /// 0..=200, 100 is neutral
    pub contrast: u32,
    /// 0..=200, 100 is neutral
    pub saturation: u32,
    /// 0.1..=10.0, 1.0 is neutral
    pub gamma: f64,
}

impl Default for ColorCorrection {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 100,
            saturation: 100,
            gamma: 1.0,
        }
    }
}

impl ColorCorrection {
    /// `eq` filter for these settings.
    ///
    /// brightness -100..100 maps to -1.0..1.0 and contrast 0..200 to 0.0..2.0.
    /// Saturation maps 0..100 to 0.0..1.0 and 100..200 to 1.0..3.0, so the
    /// default settings produce an identity filter.
    pub fn build(&self) -> MediaResult<String> {
        ensure((-100..=100).contains(&self.brightness), || {
            format!("brightness must be -100..100, got {}", self.brightness)
        })?;
        ensure(self.contrast <= 200, || {
            format!("contrast must be 0..200, got {}", self.contrast)
        })?;
        ensure(self.saturation <= 200, || {
            format!("saturation must be 0..200, got {}", self.saturation)
        })?;
        ensure(self.gamma.is_finite() && (0.1..=10.0).contains(&self.gamma), || {
            format!("gamma must be 0.1..10, got {}", self.gamma)
        })?;

        Ok(format!(
            "eq=brightness={}:contrast={}:saturation={}:gamma={}",
            num(f64::from(self.brightness) / 100.0),
            num(f64::from(self.contrast) / 100.0),
            num(saturation_coefficient(self.saturation)),
            num(self.gamma)
        ))
    }
}

fn saturation_coefficient(saturation: u32) -> f64 {
    let s = f64::from(saturation);
    if saturation <= 100 {
        s / 100.0
    } else {
        1.0 + (s - 100.0) / 50.0
    }
}

/// Concatenate `inputs` video streams; output is labelled `[outv]`.
pub fn merge(inputs: usize) -> MediaResult<String> {
    ensure(inputs >= 2, || format!("merge needs at least two inputs, got {inputs}"))?;
    let labels: String = (0..inputs).map(|i| format!("[{i}:v]")).collect();
    Ok(format!("{labels}concat=n={inputs}:v=1:a=0[outv]"))
}

/// Export resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "4k")]
    Uhd4k,
}

impl Resolution {
    pub fn height(&self) -> u32 {
        match self {
            Resolution::P480 => 480,
            Resolution::P720 => 720,
            Resolution::P1080 => 1080,
            Resolution::Uhd4k => 2160,
        }
    }
}

impl FromStr for Resolution {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "480p" => Ok(Resolution::P480),
            "720p" => Ok(Resolution::P720),
            "1080p" => Ok(Resolution::P1080),
            "4k" | "2160p" => Ok(Resolution::Uhd4k),
            other => Err(MediaError::invalid_parameter(format!("unknown resolution: {other}"))),
        }
    }
}

/// Scale to `resolution` keeping aspect ratio (even width).
pub fn export(resolution: Resolution) -> String {
    format!("scale=-2:{}", resolution.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(trim(1.5, 4.0).unwrap(), "trim=start=1.5:end=4,setpts=PTS-STARTPTS");
        assert!(trim(4.0, 1.0).is_err());
        assert!(trim(-1.0, 1.0).is_err());
        assert!(trim(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_crop() {
        assert_eq!(crop(1080, 1920, 10, 0).unwrap(), "crop=1080:1920:10:0");
        assert!(matches!(crop(0, 10, 0, 0), Err(MediaError::InvalidParameter(_))));
    }

    #[test]
    fn test_rotate() {
        assert_eq!(rotate(90.0).unwrap(), "transpose=1");
        assert_eq!(rotate(-90.0).unwrap(), "transpose=2");
        assert_eq!(rotate(540.0).unwrap(), "hflip,vflip");
        assert_eq!(rotate(360.0).unwrap(), "null");
        assert!(rotate(45.0).unwrap().starts_with("rotate=0.785:"));
    }

    #[test]
    fn test_intensity_zero_is_identity() {
        assert_eq!(FilterPreset::Grayscale.build(0).unwrap(), "hue=s=1");
        assert_eq!(FilterPreset::Blur.build(0).unwrap(), "gblur=sigma=0");
        assert_eq!(FilterPreset::Sharpen.build(0).unwrap(), "unsharp=5:5:0:5:5:0");
        assert_eq!(
            FilterPreset::Sepia.build(0).unwrap(),
            "colorchannelmixer=rr=1:rg=0:rb=0:gr=0:gg=1:gb=0:br=0:bg=0:bb=1"
        );
    }

    #[test]
    fn test_intensity_full_is_max() {
        assert_eq!(FilterPreset::Grayscale.build(100).unwrap(), "hue=s=0");
        assert_eq!(FilterPreset::Blur.build(100).unwrap(), "gblur=sigma=10");
        assert_eq!(FilterPreset::Sharpen.build(100).unwrap(), "unsharp=5:5:1.5:5:5:0");
        assert!(FilterPreset::Sepia
            .build(100)
            .unwrap()
            .starts_with("colorchannelmixer=rr=0.393:rg=0.769"));
        assert_eq!(FilterPreset::Blur.build(50).unwrap(), "gblur=sigma=5");
        assert!(FilterPreset::Vintage.build(101).is_err());
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("Sepia".parse::<FilterPreset>().unwrap(), FilterPreset::Sepia);
        assert!("neon".parse::<FilterPreset>().is_err());
        assert_eq!(
            serde_json::from_str::<FilterPreset>("\"vintage\"").unwrap(),
            FilterPreset::Vintage
        );
    }

    #[test]
    fn test_default_color_correction_is_identity() {
        let graph = ColorCorrection::default().build().unwrap();
        let coefficients: Vec<f64> = graph
            .trim_start_matches("eq=")
            .split(':')
            .map(|kv| kv.split_once('=').unwrap().1.parse().unwrap())
            .collect();
        assert_eq!(coefficients, vec![0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_color_correction_mapping() {
        assert_eq!(
            ColorCorrection::default().build().unwrap(),
            "eq=brightness=0:contrast=1:saturation=1:gamma=1"
        );
        let half = ColorCorrection {
            saturation: 50,
            ..Default::default()
        };
        assert!(half.build().unwrap().contains("saturation=0.5:"));
        let boosted = ColorCorrection {
            saturation: 150,
            ..Default::default()
        };
        assert!(boosted.build().unwrap().contains("saturation=2:"));
        let c = ColorCorrection {
            brightness: -100,
            contrast: 200,
            saturation: 200,
            gamma: 2.2,
        };
        assert_eq!(
            c.build().unwrap(),
            "eq=brightness=-1:contrast=2:saturation=3:gamma=2.2"
        );
        let bad = ColorCorrection {
            brightness: 150,
            ..Default::default()
        };
        assert!(bad.build().is_err());
    }

    #[test]
    fn test_merge_and_export() {
        assert_eq!(merge(3).unwrap(), "[0:v][1:v][2:v]concat=n=3:v=1:a=0[outv]");
        assert!(merge(1).is_err());
        assert_eq!(export(Resolution::P720), "scale=-2:720");
        assert_eq!("4K".parse::<Resolution>().unwrap(), Resolution::Uhd4k);
    }

    #[test]
    fn test_chain_skips_empty() {
        let graph = chain([trim(0.0, 2.0).unwrap(), String::new(), export(Resolution::P480)]);
        assert_eq!(graph, "trim=start=0:end=2,setpts=PTS-STARTPTS,scale=-2:480");
    }
}

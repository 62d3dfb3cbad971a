//! Simple configuration persistence for Platter
//!
//! Stores default tempo, platter speed, output format and the last sample
//! that was played.

use platter_automation::{DEFAULT_BPM, DEFAULT_RPM};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sample format for rendered WAV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 16-bit integer PCM
    #[default]
    Int16,
    /// 24-bit integer PCM
    Int24,
    /// 32-bit IEEE float
    Float32,
}

impl BitDepth {
    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            16 => Some(BitDepth::Int16),
            24 => Some(BitDepth::Int24),
            32 => Some(BitDepth::Float32),
            _ => None,
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Tempo for presets, in beats per minute
    pub bpm: f64,
    /// Platter speed for presets, in revolutions per minute
    pub rpm: f64,
    /// Resample decoded samples to this rate (keeps the file's rate if unset)
    pub output_sample_rate: Option<u32>,
    /// Sample format for renders
    pub bit_depth: BitDepth,
    /// Sample used when a routine names none
    pub last_sample: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            rpm: DEFAULT_RPM,
            output_sample_rate: None,
            bit_depth: BitDepth::default(),
            last_sample: None,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.serialize();
        fs::write(path, content)
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("platter")
            .join("config.txt")
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "bpm" => {
                        if let Some(bpm) = parse_positive(value) {
                            config.bpm = bpm;
                        }
                    }
                    "rpm" => {
                        if let Some(rpm) = parse_positive(value) {
                            config.rpm = rpm;
                        }
                    }
                    "output_sample_rate" => {
                        config.output_sample_rate = value.parse::<u32>().ok().filter(|&r| r > 0);
                    }
                    "bit_depth" => {
                        if let Some(depth) = value.parse().ok().and_then(BitDepth::from_bits) {
                            config.bit_depth = depth;
                        }
                    }
                    "last_sample" => {
                        if !value.is_empty() {
                            config.last_sample = Some(PathBuf::from(value));
                        }
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# Platter Configuration".to_string());
        lines.push(format!("bpm={}", self.bpm));
        lines.push(format!("rpm={}", self.rpm));
        lines.push(format!("bit_depth={}", self.bit_depth.bits()));

        if let Some(rate) = self.output_sample_rate {
            lines.push(format!("output_sample_rate={rate}"));
        }

        if let Some(ref sample) = self.last_sample {
            lines.push(format!("last_sample={}", sample.display()));
        }

        lines.join("\n")
    }
}

fn parse_positive(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("");
        assert_eq!(config, Config::default());
        assert_eq!(config.bpm, 100.0);
        assert_eq!(config.rpm, 33.0);
        assert_eq!(config.bit_depth, BitDepth::Int16);
    }

    #[test]
    fn test_parse_values() {
        let config = Config::parse(
            "bpm=92.5\nrpm=45\noutput_sample_rate=48000\nbit_depth=24\nlast_sample=/samples/ahh.wav",
        );
        assert_eq!(config.bpm, 92.5);
        assert_eq!(config.rpm, 45.0);
        assert_eq!(config.output_sample_rate, Some(48000));
        assert_eq!(config.bit_depth, BitDepth::Int24);
        assert_eq!(config.last_sample, Some(PathBuf::from("/samples/ahh.wav")));
    }

    #[test]
    fn test_parse_with_comments() {
        let content = "# Comment\nrpm = 45\n# Another comment";
        let config = Config::parse(content);
        assert_eq!(config.rpm, 45.0);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = Config::parse("bpm=fast\nrpm=-33\nbit_depth=12\noutput_sample_rate=0\ncolour=red");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config {
            bpm: 88.0,
            rpm: 45.0,
            output_sample_rate: Some(44100),
            bit_depth: BitDepth::Float32,
            last_sample: Some(PathBuf::from("/test/path.flac")),
        };

        let serialized = config.serialize();
        let parsed = Config::parse(&serialized);

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("platter-config-{}", std::process::id()))
            .join("config.txt");
        let config = Config {
            bpm: 120.0,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }

        assert_eq!(loaded.bpm, 120.0);
    }
}

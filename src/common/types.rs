use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::errors::StreamError;

/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Opaque identifier of a piece of media on the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Accepts any non-blank identifier; surrounding whitespace is dropped.
    pub fn parse(raw: &str) -> Result<Self, StreamError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StreamError::InvalidRequest(
                "missing required query parameter 'id'".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for ContentId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse bitrate bucket requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn target_kbps(self) -> u32 {
        match self {
            Self::High => 192,
            Self::Medium => 128,
            Self::Low => 96,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Resolves the `quality` query value. Absent or blank values use
    /// `default`; unrecognised values fall back to `Medium`.
    pub fn from_query(raw: Option<&str>, default: QualityTier) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => default,
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::debug!("Unknown quality tier '{}', using medium", value);
                Self::Medium
            }),
        }
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown quality tier: {}", other)),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_rejects_blank() {
        assert!(matches!(
            ContentId::parse("   "),
            Err(StreamError::InvalidRequest(_))
        ));
        assert_eq!(ContentId::parse(" abc123 ").unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_quality_targets() {
        assert_eq!(QualityTier::High.target_kbps(), 192);
        assert_eq!(QualityTier::Medium.target_kbps(), 128);
        assert_eq!(QualityTier::Low.target_kbps(), 96);
    }

    #[test]
    fn test_quality_from_query() {
        assert_eq!(
            QualityTier::from_query(None, QualityTier::High),
            QualityTier::High
        );
        assert_eq!(
            QualityTier::from_query(Some(""), QualityTier::Low),
            QualityTier::Low
        );
        assert_eq!(
            QualityTier::from_query(Some("LOW"), QualityTier::High),
            QualityTier::Low
        );
        assert_eq!(
            QualityTier::from_query(Some("lossless"), QualityTier::High),
            QualityTier::Medium
        );
    }
}

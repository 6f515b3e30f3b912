//! Source classification.
//!
//! A classifier maps a source's statistics to a [`SourceType`]. Two
//! implementations are provided:
//!
//! - **empirical**: hand-tuned thresholds on flux ratio, eigenvalues and orientation
//! - **network**: small pretrained feed-forward network on the same features
//!
//! Both are used through the [`SourceClassifier`] trait so the detection
//! facade and the batch tools are independent of the choice.

pub mod empirical;
pub mod network;

pub use empirical::EmpiricalClassifier;
pub use network::{FeedForwardNetwork, NetworkClassifier, NetworkError, PRETRAINED_PARAMETERS};

use crate::config::EmpiricalClassifierConfig;
use crate::source::{Source, SourceType};
use serde::{Deserialize, Serialize};

/// Assigns a type to a source from its statistics
///
/// Implementations must not depend on anything but the source, so that
/// classifying the same source twice gives the same answer.
pub trait SourceClassifier: Send + Sync {
    fn classify(&self, source: &Source) -> SourceType;
}

/// Available classifier implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Empirical,
    Network,
}

impl ClassifierKind {
    /// Instantiate the classifier
    ///
    /// # Arguments
    /// * `empirical` - Thresholds used when this is [`ClassifierKind::Empirical`]
    pub fn build(self, empirical: &EmpiricalClassifierConfig) -> Result<Box<dyn SourceClassifier>, NetworkError> {
        Ok(match self {
            ClassifierKind::Empirical => Box::new(EmpiricalClassifier::new(*empirical)),
            ClassifierKind::Network => Box::new(NetworkClassifier::pretrained()?),
        })
    }
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empirical" => Ok(ClassifierKind::Empirical),
            "network" | "nn" => Ok(ClassifierKind::Network),
            _ => Err(format!(
                "Unknown classifier: {}. Valid options: empirical, network",
                s
            )),
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Empirical => write!(f, "empirical"),
            ClassifierKind::Network => write!(f, "network"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WindowGeometry;

    #[test]
    fn test_classifier_kind_from_str() {
        assert_eq!("empirical".parse::<ClassifierKind>().unwrap(), ClassifierKind::Empirical);
        assert_eq!("NN".parse::<ClassifierKind>().unwrap(), ClassifierKind::Network);
        assert_eq!("network".parse::<ClassifierKind>().unwrap(), ClassifierKind::Network);
        assert!("svm".parse::<ClassifierKind>().is_err());
        assert_eq!(ClassifierKind::Network.to_string(), "network");
    }

    #[test]
    fn test_build_both_kinds() {
        let config = EmpiricalClassifierConfig::default();
        let source = Source::new(WindowGeometry::new(12, 12, 1, 1));
        for kind in [ClassifierKind::Empirical, ClassifierKind::Network] {
            let classifier = kind.build(&config).unwrap();
            // An empty source has no usable statistics
            assert_eq!(classifier.classify(&source), SourceType::Unknown);
        }
    }
}

//! Interpolator vocabulary.
//!
//! The two calling conventions spell interpolator names differently:
//! `antsApplyTransforms` takes `Linear`/`NearestNeighbor`, the ANTsPy
//! runtime takes `linear`/`nearestNeighbor`.

use std::str::FromStr;

use crate::error::RegistrationError;

/// Interpolation used when resampling through a transform chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Trilinear interpolation, for intensity volumes.
    Linear,
    /// Nearest-neighbor interpolation, safe for label masks.
    #[default]
    NearestNeighbor,
}

impl Interpolation {
    /// The `-n` value for `antsApplyTransforms`.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::NearestNeighbor => "NearestNeighbor",
        }
    }

    /// The `interpolator` argument for the ANTsPy runtime.
    pub fn antspy_name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::NearestNeighbor => "nearestNeighbor",
        }
    }
}

impl FromStr for Interpolation {
    type Err = RegistrationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case("linear") {
            Ok(Self::Linear)
        } else if name.eq_ignore_ascii_case("nearestneighbor")
            || name.eq_ignore_ascii_case("nearest")
        {
            Ok(Self::NearestNeighbor)
        } else {
            Err(RegistrationError::invalid_configuration(format!(
                "unknown interpolation: {name}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_per_convention() {
        assert_eq!(Interpolation::Linear.cli_name(), "Linear");
        assert_eq!(Interpolation::Linear.antspy_name(), "linear");
        assert_eq!(Interpolation::NearestNeighbor.cli_name(), "NearestNeighbor");
        assert_eq!(Interpolation::NearestNeighbor.antspy_name(), "nearestNeighbor");
    }

    #[test]
    fn test_parse_both_spellings() {
        assert_eq!("linear".parse::<Interpolation>().unwrap(), Interpolation::Linear);
        assert_eq!("Linear".parse::<Interpolation>().unwrap(), Interpolation::Linear);
        assert_eq!(
            "nearestNeighbor".parse::<Interpolation>().unwrap(),
            Interpolation::NearestNeighbor
        );
        assert_eq!(
            "NearestNeighbor".parse::<Interpolation>().unwrap(),
            Interpolation::NearestNeighbor
        );
    }

    #[test]
    fn test_default_is_label_safe() {
        assert_eq!(Interpolation::default(), Interpolation::NearestNeighbor);
    }

    #[test]
    fn test_parse_unknown() {
        assert!("bspline".parse::<Interpolation>().is_err());
    }
}

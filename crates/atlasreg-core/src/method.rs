//! Registration method vocabulary.
//!
//! Pipeline configurations carry ANTs method tags in several spellings
//! (short flags, script names with bracketed transforms). Parsing normalizes
//! them onto the methods the coordinator actually drives.

use std::fmt;
use std::str::FromStr;

use crate::error::RegistrationError;

/// Registration method delegated to the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationMethod {
    /// Quick symmetric normalization. Plain `SyN` tags are remapped here;
    /// the full run is only selected by its explicit script tag.
    SynQuick,
    /// Full symmetric normalization.
    Syn,
    /// Affine-only registration.
    Affine,
    /// Rigid-only registration.
    Rigid,
}

impl RegistrationMethod {
    /// Registration entry point within the ANTs scripts directory.
    pub fn script_name(&self) -> &'static str {
        match self {
            Self::SynQuick => "antsRegistrationSyNQuick.sh",
            Self::Syn | Self::Affine | Self::Rigid => "antsRegistrationSyN.sh",
        }
    }

    /// Value of the script's `-t` option.
    pub fn transform_flag(&self) -> &'static str {
        match self {
            Self::SynQuick | Self::Syn => "s",
            Self::Affine => "a",
            Self::Rigid => "r",
        }
    }

    /// `type_of_transform` for the ANTsPy runtime. The quick variant is not
    /// portable across ANTsPy platforms and normalizes to `SyN`.
    pub fn antspy_name(&self) -> &'static str {
        match self {
            Self::SynQuick | Self::Syn => "SyN",
            Self::Affine => "Affine",
            Self::Rigid => "Rigid",
        }
    }

    /// Whether the run produces a warp field in addition to the affine.
    pub fn is_deformable(&self) -> bool {
        matches!(self, Self::SynQuick | Self::Syn)
    }
}

impl FromStr for RegistrationMethod {
    type Err = RegistrationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "sq" | "SyN" | "antsRegistrationSyNQuick[s]" => Ok(Self::SynQuick),
            "s" | "antsRegistrationSyN[s]" => Ok(Self::Syn),
            "a" | "Affine" => Ok(Self::Affine),
            "r" | "Rigid" => Ok(Self::Rigid),
            _ => Err(RegistrationError::invalid_configuration(format!(
                "unknown registration method tag: {tag}"
            ))),
        }
    }
}

impl fmt::Display for RegistrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SynQuick => "SyNQuick",
            Self::Syn => "SyN",
            Self::Affine => "Affine",
            Self::Rigid => "Rigid",
        };
        write!(f, "{name}")
    }
}

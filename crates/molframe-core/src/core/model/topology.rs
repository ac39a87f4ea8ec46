use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single = 1,
    Double = 2,
    Triple = 3,
    Quadruple = 4,
    Aromatic = 5,
}

impl BondOrder {
    /// Numeric order; aromatic bonds count as 1.
    pub fn as_int(self) -> u8 {
        match self {
            Self::Aromatic => 1,
            other => other as u8,
        }
    }

    pub fn from_int(order: i64) -> Option<Self> {
        match order {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            4 => Some(Self::Quadruple),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "s" | "sing" | "single" => Ok(Self::Single),
            "2" | "d" | "doub" | "double" => Ok(Self::Double),
            "3" | "t" | "trip" | "triple" => Ok(Self::Triple),
            "4" | "q" | "quad" | "quadruple" => Ok(Self::Quadruple),
            "ar" | "arom" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Quadruple => "Quadruple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// Bond classification bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BondFlags(u16);

impl BondFlags {
    pub const NONE: Self = Self(0);
    pub const COVALENT: Self = Self(1);
    pub const METALLIC_COORDINATION: Self = Self(2);
    pub const HYDROGEN_BOND: Self = Self(4);
    pub const DISULFIDE: Self = Self(8);
    pub const AROMATIC: Self = Self(16);
    /// Set on bonds inferred from geometry rather than read from a record.
    pub const COMPUTED: Self = Self(32);
    /// Explicitly marked as not aromatic by the source.
    pub const NON_AROMATIC: Self = Self(64);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn is_covalent(self) -> bool {
        self.intersects(Self::COVALENT)
    }

    /// Parses an mmCIF `struct_conn.conn_type_id`.
    pub fn from_conn_type(conn_type: &str) -> Self {
        match conn_type.trim().to_lowercase().as_str() {
            "covale" | "covale_base" | "covale_phosphate" | "covale_sugar" | "modres" => {
                Self::COVALENT
            }
            "disulf" => Self::COVALENT | Self::DISULFIDE,
            "metalc" => Self::METALLIC_COORDINATION,
            "hydrog" => Self::HYDROGEN_BOND,
            _ => Self::NONE,
        }
    }
}

impl BitOr for BondFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BondFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for BondFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

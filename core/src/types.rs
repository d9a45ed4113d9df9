use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of a card, unique within one deck. Assigned from 1.
pub type CardId = u32;

/// How many cards have to share a value to count as one match.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GroupSize {
    #[default]
    Two,
    Three,
    Four,
}

impl GroupSize {
    pub const ALL: [GroupSize; 3] = [GroupSize::Two, GroupSize::Three, GroupSize::Four];

    pub const fn get(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

impl TryFrom<u8> for GroupSize {
    type Error = InvalidGroupSize;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            other => Err(InvalidGroupSize(other)),
        }
    }
}

impl From<GroupSize> for u8 {
    fn from(value: GroupSize) -> Self {
        value.get() as u8
    }
}

impl fmt::Display for GroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidGroupSize(pub u8);

impl fmt::Display for InvalidGroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported group size {}", self.0)
    }
}

/// Named symbol theme, also the gating unit for entitlements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryId {
    #[default]
    Animals,
    Letters,
    Numbers,
    Hospital,
    UtilityCars,
}

impl CategoryId {
    pub const ALL: [CategoryId; 5] = [
        CategoryId::Animals,
        CategoryId::Letters,
        CategoryId::Numbers,
        CategoryId::Hospital,
        CategoryId::UtilityCars,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Animals => "animals",
            Self::Letters => "letters",
            Self::Numbers => "numbers",
            Self::Hospital => "hospital",
            Self::UtilityCars => "utility-cars",
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category {:?}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryId::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

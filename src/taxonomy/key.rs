//! Typed country/city/neighborhood keys.
//!
//! A key is stored and sent over the wire in its pipe-delimited form
//! (`colombia|bogota|chapinero`). Segments can never be empty nor contain the
//! delimiter, so the encoded form always round-trips.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const KEY_DELIMITER: char = '|';
pub const MAX_KEY_DEPTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationKeyError {
    #[error("Location key is empty")]
    Empty,
    #[error("Location key has {0} segments, at most 3 are allowed")]
    TooManySegments(usize),
    #[error("Location key segment {0} is empty")]
    EmptySegment(usize),
    #[error("Location key segment '{0}' contains the '|' delimiter")]
    ContainsDelimiter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationKey {
    country: String,
    city: Option<String>,
    neighborhood: Option<String>,
}

fn check_segment(index: usize, segment: &str) -> Result<(), LocationKeyError> {
    if segment.is_empty() {
        return Err(LocationKeyError::EmptySegment(index));
    }
    if segment.contains(KEY_DELIMITER) {
        return Err(LocationKeyError::ContainsDelimiter(segment.to_string()));
    }
    Ok(())
}

impl LocationKey {
    pub fn country<S: Into<String>>(country: S) -> Result<Self, LocationKeyError> {
        let country = country.into();
        check_segment(0, &country)?;
        Ok(Self {
            country,
            city: None,
            neighborhood: None,
        })
    }

    pub fn city<S: Into<String>>(country: S, city: S) -> Result<Self, LocationKeyError> {
        let mut key = Self::country(country)?;
        let city = city.into();
        check_segment(1, &city)?;
        key.city = Some(city);
        Ok(key)
    }

    pub fn neighborhood<S: Into<String>>(
        country: S,
        city: S,
        neighborhood: S,
    ) -> Result<Self, LocationKeyError> {
        let mut key = Self::city(country, city)?;
        let neighborhood = neighborhood.into();
        check_segment(2, &neighborhood)?;
        key.neighborhood = Some(neighborhood);
        Ok(key)
    }

    /// Builds a key from up to three leading segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, LocationKeyError> {
        match segments {
            [] => Err(LocationKeyError::Empty),
            [country] => Self::country(country.as_ref()),
            [country, city] => Self::city(country.as_ref(), city.as_ref()),
            [country, city, neighborhood] => {
                Self::neighborhood(country.as_ref(), city.as_ref(), neighborhood.as_ref())
            }
            _ => Err(LocationKeyError::TooManySegments(segments.len())),
        }
    }

    /// Parses the pipe-delimited form, returning `None` for anything that is not a
    /// well formed key of 1 to 3 non-empty segments.
    pub fn parse(encoded: &str) -> Option<Self> {
        encoded.parse().ok()
    }

    pub fn country_segment(&self) -> &str {
        &self.country
    }

    pub fn city_segment(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn neighborhood_segment(&self) -> Option<&str> {
        self.neighborhood.as_deref()
    }

    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec![self.country.as_str()];
        segments.extend(self.city.as_deref());
        segments.extend(self.neighborhood.as_deref());
        segments
    }

    pub fn depth(&self) -> usize {
        1 + self.city.is_some() as usize + self.neighborhood.is_some() as usize
    }

    pub fn parent(&self) -> Option<Self> {
        match (&self.city, &self.neighborhood) {
            (_, Some(_)) => Some(Self {
                country: self.country.clone(),
                city: self.city.clone(),
                neighborhood: None,
            }),
            (Some(_), None) => Some(Self {
                country: self.country.clone(),
                city: None,
                neighborhood: None,
            }),
            (None, None) => None,
        }
    }

    /// True when `self` equals `ancestor` or lies below it in the hierarchy.
    pub fn is_within(&self, ancestor: &LocationKey) -> bool {
        let own = self.segments();
        let other = ancestor.segments();
        other.len() <= own.len() && own.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.country)?;
        if let Some(city) = &self.city {
            write!(f, "{}{}", KEY_DELIMITER, city)?;
        }
        if let Some(neighborhood) = &self.neighborhood {
            write!(f, "{}{}", KEY_DELIMITER, neighborhood)?;
        }
        Ok(())
    }
}

impl FromStr for LocationKey {
    type Err = LocationKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(LocationKeyError::Empty);
        }
        let segments: Vec<&str> = s.split(KEY_DELIMITER).collect();
        if segments.len() > MAX_KEY_DEPTH {
            return Err(LocationKeyError::TooManySegments(segments.len()));
        }
        Self::from_segments(&segments)
    }
}

impl TryFrom<String> for LocationKey {
    type Error = LocationKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LocationKey> for String {
    fn from(key: LocationKey) -> Self {
        key.to_string()
    }
}

/// Prefix containment over encoded keys: `key` is in scope of `ancestor` when they are
/// equal or `key` continues `ancestor` with a further `|` segment.
pub fn is_in_scope(key: &str, ancestor: &str) -> bool {
    if key == ancestor {
        return true;
    }
    key.len() > ancestor.len()
        && key.starts_with(ancestor)
        && key[ancestor.len()..].starts_with(KEY_DELIMITER)
}

/// True for a well formed key of 1 to 3 non-empty segments.
pub fn is_valid_location_key(encoded: &str) -> bool {
    LocationKey::parse(encoded).is_some()
}

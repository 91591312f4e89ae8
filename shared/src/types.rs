//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// The two physical stocking locations tracked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    Shelf,
    Line,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Shelf => "SHELF",
            Location::Line => "LINE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SHELF" => Some(Location::Shelf),
            "LINE" => Some(Location::Line),
            _ => None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit a chemical is bought and counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseUnit {
    Box,
    Bucket,
    Barrel,
}

impl PurchaseUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseUnit::Box => "BOX",
            PurchaseUnit::Bucket => "BUCKET",
            PurchaseUnit::Barrel => "BARREL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BOX" => Some(PurchaseUnit::Box),
            "BUCKET" => Some(PurchaseUnit::Bucket),
            "BARREL" => Some(PurchaseUnit::Barrel),
            _ => None,
        }
    }

    /// Lowercase singular label for display ("2.5 boxes", "1 barrel")
    pub fn label(&self) -> &'static str {
        match self {
            PurchaseUnit::Box => "box",
            PurchaseUnit::Bucket => "bucket",
            PurchaseUnit::Barrel => "barrel",
        }
    }

    /// Lowercase plural label for display
    pub fn label_plural(&self) -> &'static str {
        match self {
            PurchaseUnit::Box => "boxes",
            PurchaseUnit::Bucket => "buckets",
            PurchaseUnit::Barrel => "barrels",
        }
    }
}

impl std::fmt::Display for PurchaseUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

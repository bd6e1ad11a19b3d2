use crate::ResultError;

/// Screen coordinates of a match, in snapshot pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Outcome of one match against a snapshot.
///
/// A found result always has coordinates and a confidence in `(0, 1]`; a
/// miss has neither. The constructors are the only way to build one, so the
/// pairing holds for every value in circulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    found: bool,
    coordinates: Option<Point>,
    confidence: f32,
}

impl SearchResult {
    pub fn found(at: Point, confidence: f32) -> Result<Self, ResultError> {
        if !confidence.is_finite() || confidence <= 0.0 || confidence > 1.0 {
            return Err(ResultError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            found: true,
            coordinates: Some(at),
            confidence,
        })
    }

    pub const fn not_found() -> Self {
        Self {
            found: false,
            coordinates: None,
            confidence: 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn coordinates(&self) -> Option<Point> {
        self.coordinates
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl Default for SearchResult {
    fn default() -> Self {
        Self::not_found()
    }
}

//! Collection module - the discovery categories peer records are filed under

use std::fmt;

/// Named record collection
///
/// Peers advertise themselves in one of two discovery categories:
/// - Ship: hosts advertising which topics they accept submissions for
/// - Slap: hosts advertising which lookup services they answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// SHIP advertisements (topic hosting)
    Ship,

    /// SLAP advertisements (lookup availability)
    Slap,
}

impl Collection {
    /// Every collection, in sweep order
    pub const ALL: [Collection; 2] = [Collection::Ship, Collection::Slap];

    /// Storage name of the collection
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Ship => "shipRecords",
            Collection::Slap => "slapRecords",
        }
    }

    /// Parse a collection from its storage name or short form
    ///
    /// # Examples
    ///
    /// ```
    /// use overlay_domain::Collection;
    ///
    /// assert_eq!(Collection::parse("shipRecords"), Some(Collection::Ship));
    /// assert_eq!(Collection::parse("SLAP"), Some(Collection::Slap));
    /// assert_eq!(Collection::parse("users"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ship" | "shiprecords" => Some(Collection::Ship),
            "slap" | "slaprecords" => Some(Collection::Slap),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

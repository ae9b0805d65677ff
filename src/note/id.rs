use derive_more::{AsRef, Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for notes, generated on the client when the note is created.
///
/// Identifiers read back from a document are accepted verbatim, so notes written by
/// other clients (e.g. with cuid-style ids) keep their identity.
#[derive(
    Serialize, Deserialize, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, AsRef, Display, From,
)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generates a fresh, collision-resistant identifier without a server round-trip.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for NoteId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NoteId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

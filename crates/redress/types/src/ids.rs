//! Newtype identifiers for every row kind.
//!
//! Ids are opaque strings (uuid v4 when generated locally) so rows created
//! by external collaborators - the detection pipeline, the auth layer -
//! can carry their own identifiers unchanged.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The first eight characters, for display. External ids may
            /// carry multibyte text, so this never slices mid-character.
            pub fn short(&self) -> &str {
                match self.0.char_indices().nth(8) {
                    Some((idx, _)) => &self.0[..idx],
                    None => &self.0,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// A detected compliance flag
    FlagId
);
string_id!(
    /// The (at most one) remediation record attached to a flag
    ResolutionId
);
string_id!(
    /// A remediation action item
    TaskId
);
string_id!(
    /// An append-only evidence artifact
    EvidenceId
);
string_id!(
    /// A single reviewer decision event
    VerificationId
);
string_id!(
    /// The tenant boundary every action is scoped to
    WorkspaceId
);
string_id!(
    /// The recorded client meeting a flag was raised against
    MeetingId
);
string_id!(
    /// A workspace member (advisor or compliance owner)
    UserId
);

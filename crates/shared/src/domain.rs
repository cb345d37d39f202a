use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

// Key the backend stores a customer's records under.
id_newtype!(IdentityKey);
// Server-assigned id of a created intake (genetic test) record.
id_newtype!(RecordId);

/// One-shot identity minted for an anonymous intake submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(pub Uuid);

impl IdentityToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Intake field names used by the reference two-step flow.
pub mod fields {
    pub const FULL_NAME: &str = "full_name";
    pub const PHONE: &str = "phone";
    pub const EMAIL: &str = "email";

    pub const IDENTITY: &[&str] = &[FULL_NAME, PHONE, EMAIL];
}

/// Agreement names shown on the consent step.
pub mod agreements {
    pub const GENETIC_TEST: &str = "genetic_test";
    pub const PRIVACY: &str = "privacy";
    pub const TERMS: &str = "terms";

    pub const ALL: &[&str] = &[GENETIC_TEST, PRIVACY, TERMS];
}

/// Raw status strings as the backend services emit them.
pub mod status {
    pub const COMPLETED: &str = "완료";
    pub const ACTIVE: &str = "활성";
    pub const ANALYSING: &str = "분석중";
    pub const IN_TRANSIT: &str = "배송중";
    pub const APPLIED: &str = "신청";
    pub const PREPARING: &str = "준비중";
    pub const CONSULTATION_REQUESTED: &str = "상담신청";
}

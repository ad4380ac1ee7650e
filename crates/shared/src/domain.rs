use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(ProposalId);
id_newtype!(OrderId);

impl ProposalId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl OrderId {
    pub fn generate() -> Self {
        Self(format!("order_{}", uuid::Uuid::new_v4().simple()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Created,
    Paid,
}

/// Upper bound on the recipient name accepted by the create endpoints.
pub const MAX_VALENTINE_NAME_CHARS: usize = 100;
/// Upper bound on the custom message accepted by the create endpoints.
pub const MAX_CUSTOM_MESSAGE_CHARS: usize = 500;
/// Message stored when the builder leaves the custom message empty.
pub const DEFAULT_CUSTOM_MESSAGE: &str = "Will you be my Valentine?";

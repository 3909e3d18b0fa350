//! Services are used to express ways of communicating with the DID subject or associated entities.
//! Can be any type of service the DID subject wants to advertise, including decentralized identity
//! management services for further discovery, authentication, authorization, or interaction.

use serde::{Deserialize, Serialize};

/// Service description.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    /// Identifier for the service. Should be unique for services within the DID document.
    pub id: String,
    /// The type of service.
    #[serde(rename = "type")]
    pub type_: String,
    /// Location of the service.
    pub service_endpoint: String,
}

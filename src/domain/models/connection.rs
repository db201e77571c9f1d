use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connected,
    Connecting,
    Error,
}

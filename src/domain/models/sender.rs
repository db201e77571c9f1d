use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    #[strum(serialize = "You")]
    User,
    #[strum(serialize = "Assistant")]
    Assistant,
}

use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Flash message carried across a post/redirect/get round trip.
#[derive(Serialize, serde::Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Flash {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

use serde::Deserialize;

/// Every field optional: create validates the whole payload, update merges it
/// over the stored address first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPayload {
    pub house_flat: Option<String>,
    pub street: Option<String>,
    pub landmark: Option<String>,
    pub area: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

use serde::{Deserialize, Deserializer, Serialize};

/// Plain confirmation body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Template deleted")]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Serde helper for lenient string lists.
///
/// * JSON field absent or null => `None`
/// * JSON string               => `Some(vec![s])`
/// * JSON array of strings     => `Some(list)`
pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(list) => list,
        }),
    )
}

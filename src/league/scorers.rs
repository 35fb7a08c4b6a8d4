use serde::{Deserialize, Deserializer, Serialize};

/// Top scorer entry. The feed already orders entries by rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_crest: Option<String>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub goals: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub assists: u32,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub penalties: u32,
}

fn zero_if_null<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(d)?.unwrap_or(0))
}

/// Body of `/api/teams/scorers/{league}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScorersPayload {
    #[serde(default)]
    pub scorers: Vec<Scorer>,
}

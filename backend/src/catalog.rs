use serde::{Deserialize, Serialize};

pub const FALLBACK_BUCKET: &str = "all";

/// A brand that always gets a share of its bucket's feed, reshuffled daily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedGroup {
    pub name: String,
    pub target_count: usize,
    /// Falls back to the group name when empty.
    #[serde(default)]
    pub queries: Vec<String>,
}

impl PinnedGroup {
    pub fn new(name: &str, target_count: usize, queries: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            target_count,
            queries: queries.iter().map(|q| q.to_string()).collect(),
        }
    }

    pub fn effective_queries(&self) -> Vec<String> {
        if self.queries.is_empty() {
            vec![self.name.clone()]
        } else {
            self.queries.clone()
        }
    }
}

/// An age bracket: pinned groups first, then the rotation pool queries fill the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    pub queries: Vec<String>,
    #[serde(default)]
    pub pinned: Vec<PinnedGroup>,
}

impl Bucket {
    pub fn new(name: &str, queries: &[&str], pinned: Vec<PinnedGroup>) -> Self {
        Self {
            name: name.to_string(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
            pinned,
        }
    }

    pub fn rotates_daily(&self) -> bool {
        self.pinned.iter().any(|group| group.target_count > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub buckets: Vec<Bucket>,
}

impl Catalog {
    pub fn new(buckets: Vec<Bucket>) -> Self {
        Self { buckets }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Case-insensitive lookup; unknown names get the `all` bucket.
    pub fn resolve(&self, name: &str) -> Option<&Bucket> {
        let wanted = name.trim().to_lowercase();
        self.buckets
            .iter()
            .find(|bucket| bucket.name.to_lowercase() == wanted)
            .or_else(|| {
                self.buckets
                    .iter()
                    .find(|bucket| bucket.name == FALLBACK_BUCKET)
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(vec![
            Bucket::new(
                "1-2",
                &[
                    "toddler learning colors cartoons",
                    "nursery rhymes for toddlers",
                    "baby sensory videos",
                ],
                vec![
                    PinnedGroup::new("ms rachel", 2, &["ms rachel toddler learning"]),
                    PinnedGroup::new("super simple songs", 2, &[]),
                ],
            ),
            Bucket::new(
                "3-5",
                &[
                    "preschool cartoons full episodes",
                    "kids learning songs",
                    "preschool educational videos",
                ],
                vec![
                    PinnedGroup::new("bluey", 2, &["bluey full episodes"]),
                    PinnedGroup::new("peppa pig", 2, &["peppa pig full episodes"]),
                    PinnedGroup::new("numberblocks", 2, &[]),
                ],
            ),
            Bucket::new(
                "6-8",
                &[
                    "kids animated series",
                    "science for kids",
                    "kids drawing tutorials",
                ],
                vec![
                    PinnedGroup::new("wild kratts", 2, &["wild kratts full episodes"]),
                    PinnedGroup::new("art for kids hub", 2, &[]),
                ],
            ),
            Bucket::new(FALLBACK_BUCKET, &["kids cartoons"], vec![]),
        ])
    }
}

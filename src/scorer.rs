// 🔢 Disclosure Scorer - Keyword weights summed over a title
// Presence-based: each keyword counts once no matter how often it appears

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordWeight {
    pub keyword: String,
    pub weight: u32,
}

/// Ordered keyword → weight table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordWeights(Vec<KeywordWeight>);

impl KeywordWeights {
    pub fn new(pairs: &[(&str, u32)]) -> Self {
        KeywordWeights(
            pairs
                .iter()
                .map(|(keyword, weight)| KeywordWeight {
                    keyword: keyword.to_string(),
                    weight: *weight,
                })
                .collect(),
        )
    }

    /// Sum of the weights of every keyword contained in `title` (case-sensitive)
    pub fn score(&self, title: &str) -> u32 {
        self.matched(title).map(|kw| kw.weight).sum()
    }

    /// Keywords found in `title`, in table order
    pub fn matched<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a KeywordWeight> + 'a {
        // Empty keywords would match everything
        self.0
            .iter()
            .filter(move |kw| !kw.keyword.is_empty() && title.contains(kw.keyword.as_str()))
    }

    pub fn entries(&self) -> &[KeywordWeight] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KeywordWeights {
    fn default() -> Self {
        KeywordWeights::new(&[
            ("공급계약", 40),
            ("매출", 40),
            ("임상", 40),
            ("승인", 40),
            ("신규사업", 30),
            ("사업목적", 30),
            ("MOU", 10),
        ])
    }
}

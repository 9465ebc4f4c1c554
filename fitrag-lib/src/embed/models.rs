use std::fmt;

use serde::Deserialize;

/// Sentence-embedding models supported through fastembed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FastEmbedModel {
    /// sentence-transformers/all-MiniLM-L6-v2, 384 dimensions
    #[default]
    #[serde(rename = "all-minilm-l6-v2")]
    AllMiniLmL6V2,
    /// BAAI/bge-small-en-v1.5, 384 dimensions
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
    /// BAAI/bge-large-en-v1.5, 1024 dimensions
    #[serde(rename = "bge-large-en-v1.5")]
    BgeLargeEnV15,
    /// intfloat/multilingual-e5-small, 384 dimensions
    MultilingualE5Small,
    /// sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2, 384 dimensions
    #[serde(rename = "paraphrase-multilingual-minilm-l12-v2")]
    ParaphraseMultilingualMiniLmL12V2,
}

impl FastEmbedModel {
    pub fn dimension(self) -> usize {
        match self {
            FastEmbedModel::BgeLargeEnV15 => 1024,
            _ => 384,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FastEmbedModel::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            FastEmbedModel::BgeSmallEnV15 => "BAAI/bge-small-en-v1.5",
            FastEmbedModel::BgeLargeEnV15 => "BAAI/bge-large-en-v1.5",
            FastEmbedModel::MultilingualE5Small => "intfloat/multilingual-e5-small",
            FastEmbedModel::ParaphraseMultilingualMiniLmL12V2 => {
                "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
            }
        }
    }

    // BGE and E5 are trained with asymmetric query/passage prompts
    pub(crate) fn query_prefix(self) -> &'static str {
        match self {
            FastEmbedModel::BgeSmallEnV15 | FastEmbedModel::BgeLargeEnV15 => {
                "Represent this sentence for searching relevant passages: "
            }
            FastEmbedModel::MultilingualE5Small => "query: ",
            _ => "",
        }
    }

    pub(crate) fn document_prefix(self) -> &'static str {
        match self {
            FastEmbedModel::MultilingualE5Small => "passage: ",
            _ => "",
        }
    }
}

impl fmt::Display for FastEmbedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        model: FastEmbedModel,
    }

    #[test]
    fn test_model_names_parse_from_config() {
        let parsed: Wrapper = toml::from_str("model = \"multilingual-e5-small\"").unwrap();
        assert_eq!(parsed.model, FastEmbedModel::MultilingualE5Small);

        let parsed: Wrapper = toml::from_str("model = \"bge-large-en-v1.5\"").unwrap();
        assert_eq!(parsed.model.dimension(), 1024);
    }
}

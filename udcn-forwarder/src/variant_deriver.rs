//! Maps a requested low-bitrate variant name to the higher-bitrate parent
//! names that could serve as its derivation source, and synthesizes the
//! child Data once a parent is found in the Object Processor cache.
//!
//! Grounded directly on the quality-ladder substring search and placeholder
//! re-signing of the original object-processor's Interest/Data handlers.

use udcn_common::ndn::{Data, Name, SignatureInfo};

pub struct VariantDeriver {
    movie_token: String,
    ladder: Vec<String>,
}

impl VariantDeriver {
    pub fn new(movie_token: String, ladder: Vec<String>) -> Self {
        Self { movie_token, ladder }
    }

    /// Candidate parent names in ascending-bitrate order above the child's
    /// own quality rung, so the closest (cheapest-to-derive-from) neighbor
    /// is tried first. Empty if the child's name doesn't carry a
    /// recognizable movie token and quality marker.
    pub fn candidate_parents(&self, child_name: &Name) -> Vec<Name> {
        let Some(last) = child_name.get(child_name.component_count().saturating_sub(1)) else {
            return Vec::new();
        };
        let without_last = child_name.dropping_last(1);
        let uri = without_last.to_string();

        let Some(movie_pos) = uri.find(&self.movie_token) else {
            return Vec::new();
        };
        let movie_end = movie_pos + self.movie_token.len();
        let Some(kbit_rel) = uri[movie_end..].find("kbit") else {
            return Vec::new();
        };
        let kbit_pos = movie_end + kbit_rel;

        let prefix = &uri[..movie_end];
        let quality = &uri[movie_end..kbit_pos];
        let suffix = &uri[kbit_pos..];

        let Some(rung) = self.ladder.iter().position(|q| q == quality) else {
            return Vec::new();
        };

        self.ladder[(rung + 1)..]
            .iter()
            .filter_map(|higher| {
                let candidate_uri = format!("{}{}{}", prefix, higher, suffix);
                Name::from_uri(&candidate_uri)
                    .ok()
                    .map(|name| name.with_component(last.clone()))
            })
            .collect()
    }

    /// Synthesizes the child's Data from a cached parent. Content length
    /// follows the parent's minus the fixed trailer the original bitrate
    /// reduction strips; the signature is a non-verifiable placeholder,
    /// since this engine never verifies signatures.
    pub fn synthesize_child(&self, child_name: &Name, parent_data: &Data) -> Data {
        let content_len = parent_data.content.len().saturating_sub(4);
        let content = vec![0u8; content_len];
        Data::new(child_name.clone(), content)
            .with_freshness_period(parent_data.freshness_period)
            .with_signature(SignatureInfo::derived_placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn deriver() -> VariantDeriver {
        VariantDeriver::new(
            "bunny_2s".to_string(),
            vec!["_50".into(), "_100".into(), "_250".into(), "_500".into()],
        )
    }

    #[test]
    fn candidates_are_higher_rungs_in_ascending_order() {
        let d = deriver();
        let child = Name::from_uri("/bunny_2s_100kbit/42").unwrap();
        let candidates = d.candidate_parents(&child);
        let uris: Vec<_> = candidates.iter().map(|n| n.to_string()).collect();
        assert_eq!(uris, vec!["/bunny_2s_250kbit/42", "/bunny_2s_500kbit/42"]);
    }

    #[test]
    fn top_rung_has_no_candidates() {
        let d = deriver();
        let child = Name::from_uri("/bunny_2s_500kbit/1").unwrap();
        assert!(d.candidate_parents(&child).is_empty());
    }

    #[test]
    fn names_missing_the_movie_token_derive_nothing() {
        let d = deriver();
        let child = Name::from_uri("/other_movie_100kbit/1").unwrap();
        assert!(d.candidate_parents(&child).is_empty());
    }

    #[test]
    fn synthesized_child_content_is_four_bytes_shorter() {
        let d = deriver();
        let parent = Data::new(
            Name::from_uri("/bunny_2s_500kbit/1").unwrap(),
            Bytes::from(vec![0u8; 100]),
        );
        let child_name = Name::from_uri("/bunny_2s_100kbit/1").unwrap();
        let child = d.synthesize_child(&child_name, &parent);
        assert_eq!(child.content.len(), 96);
        assert_eq!(child.name, child_name);
    }
}

use std::io::{Read, Write};
use std::sync::Arc;

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use tracing::info;

use crate::error::{KnnError, Result};
use crate::index::TermIndex;
use crate::matrix::SparseMatrix;
use crate::token::{StdTokenizer, Tokenizer};

use super::{KnnClassifier, KnnOptions, TrainedState};

/// Owned snapshot of a trained classifier
///
/// The tokenizer is not part of the snapshot; pass it back with
/// [`KnnData::into_classifier_with`] if the classifier used a custom one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnData {
    pub options: KnnOptions,
    /// vocabulary with ids and frequencies
    pub term_index: TermIndex,
    pub matrix: SparseMatrix,
    /// category of each matrix row
    pub categories: Vec<String>,
}

impl KnnData {
    /// Restore a classifier using the default tokenizer
    pub fn into_classifier(self) -> Result<KnnClassifier> {
        self.into_classifier_with(Arc::new(StdTokenizer::new()))
    }

    /// Restore a classifier, checking the snapshot is consistent first
    pub fn into_classifier_with(self, tokenizer: Arc<dyn Tokenizer>) -> Result<KnnClassifier> {
        self.validate()?;
        Ok(KnnClassifier::from_parts(
            self.options,
            tokenizer,
            Arc::new(self.term_index),
            TrainedState {
                matrix: self.matrix,
                categories: self.categories,
            },
        ))
    }

    fn validate(&self) -> Result<()> {
        self.options
            .validate()
            .map_err(|e| KnnError::CorruptModel(e.to_string()))?;
        self.matrix.validate().map_err(KnnError::CorruptModel)?;
        if self.categories.len() != self.matrix.row_count() {
            return Err(KnnError::CorruptModel(format!(
                "{} categories for {} rows",
                self.categories.len(),
                self.matrix.row_count()
            )));
        }
        if self.categories.iter().any(String::is_empty) {
            return Err(KnnError::CorruptModel("empty category label".to_string()));
        }
        if let Some(max) = self.matrix.max_feature() {
            if max as usize >= self.term_index.count() {
                return Err(KnnError::CorruptModel(format!(
                    "feature {} outside a vocabulary of {}",
                    max,
                    self.term_index.count()
                )));
            }
        }
        Ok(())
    }
}

impl Serialize for KnnClassifier {
    /// Serialized under one read lock, so the snapshot is never torn.
    /// Decode with [`KnnData`].
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let state = self.state.read();
        let mut out = serializer.serialize_struct("KnnData", 4)?;
        out.serialize_field("options", &self.options)?;
        out.serialize_field("term_index", self.term_index.as_ref())?;
        out.serialize_field("matrix", &state.matrix)?;
        out.serialize_field("categories", &state.categories)?;
        out.end()
    }
}

impl KnnClassifier {
    /// Owned copy of the trained state
    pub fn to_data(&self) -> KnnData {
        let state = self.state.read();
        KnnData {
            options: self.options,
            term_index: TermIndex::clone(&self.term_index),
            matrix: state.matrix.clone(),
            categories: state.categories.clone(),
        }
    }

    /// Write the trained state as CBOR
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        serde_cbor::to_writer(writer, self)?;
        info!(rows = self.len(), vocabulary = self.term_index.count(), "saved classifier");
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Read a classifier written by [`KnnClassifier::save`]
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let data: KnnData = serde_cbor::from_reader(reader)?;
        let knn = data.into_classifier()?;
        info!(rows = knn.len(), vocabulary = knn.term_index.count(), "loaded classifier");
        Ok(knn)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let data: KnnData = serde_cbor::from_slice(bytes)?;
        data.into_classifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::Similarity;
    use crate::weight::WeightScheme;

    fn trained() -> KnnClassifier {
        let knn = KnnClassifier::builder()
            .k(3)
            .weight_scheme(WeightScheme::TermFrequency)
            .similarity(Similarity::Euclidean)
            .build()
            .unwrap();
        knn.train_str("aaa bbb ccc ddd", "A").unwrap();
        knn.train_str("111 222 333 444 zzz", "X").unwrap();
        knn.train_str("bbb ccc ddd eee", "A").unwrap();
        knn
    }

    #[test]
    fn bytes_round_trip() {
        let knn = trained();
        let restored = KnnClassifier::from_bytes(&knn.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.options(), knn.options());
        assert_eq!(restored.categories(), knn.categories());
        assert_eq!(restored.term_index().terms(), knn.term_index().terms());
        assert_eq!(restored.state.read().matrix, knn.state.read().matrix);
    }

    #[test]
    fn save_and_load_through_io() {
        let knn = trained();
        let mut buf = Vec::new();
        knn.save(&mut buf).unwrap();
        let restored = KnnClassifier::load(buf.as_slice()).unwrap();
        assert_eq!(restored.classify_str("ccc ddd").unwrap(), knn.classify_str("ccc ddd").unwrap());
    }

    #[test]
    fn serialize_matches_to_data() {
        let knn = trained();
        let via_data = serde_cbor::to_vec(&knn.to_data()).unwrap();
        assert_eq!(knn.to_bytes().unwrap(), via_data);
    }

    #[test]
    fn mismatched_categories_are_corrupt() {
        let mut data = trained().to_data();
        data.categories.pop();
        assert!(matches!(data.into_classifier(), Err(KnnError::CorruptModel(_))));
    }

    #[test]
    fn unknown_feature_is_corrupt() {
        let mut data = trained().to_data();
        data.term_index = TermIndex::from_terms([("aaa", 1.0)]);
        assert!(matches!(data.into_classifier(), Err(KnnError::CorruptModel(_))));
    }

    #[test]
    fn invalid_options_are_corrupt() {
        let mut data = trained().to_data();
        data.options.k = 0;
        assert!(matches!(data.into_classifier(), Err(KnnError::CorruptModel(_))));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = KnnClassifier::from_bytes(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, KnnError::Serialization(_)));
    }
}

//! Trigram embedding provider using character trigram hashing.

use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use docqa_core::AppResult;
use std::collections::{HashMap, HashSet};

const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like a neural model, but
/// content-dependent and stable, which makes it suitable for tests and
/// offline use.
#[derive(Debug)]
pub struct TrigramEmbeddings {
    dimensions: usize,
}

impl TrigramEmbeddings {
    /// Create a new trigram provider with the specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            // Spread each word across several dimensions via its trigrams
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let dim = (hash_chars(window, 37) as usize) % self.dimensions;
                embedding[dim] += (*freq as f32).sqrt();
            }

            // And one dimension for the whole word
            let dim = (hash_chars(&chars, 31) as usize) % self.dimensions;
            embedding[dim] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn hash_chars(chars: &[char], multiplier: u64) -> u64 {
    chars.iter().fold(0u64, |acc, c| {
        acc.wrapping_mul(multiplier).wrapping_add(*c as u64)
    })
}

#[async_trait]
impl EmbeddingProvider for TrigramEmbeddings {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimensions_and_identity() {
        let provider = TrigramEmbeddings::new(384);
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_embeddings_are_unit_vectors() {
        let provider = TrigramEmbeddings::new(384);
        let embedding = provider.embed("hello world embedding").await.unwrap();
        assert_eq!(embedding.len(), 384);

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramEmbeddings::new(384);
        let a = provider.embed("deterministic test").await.unwrap();
        let b = provider.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let provider = TrigramEmbeddings::new(384);
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("goodbye world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramEmbeddings::new(384);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_words_are_more_similar() {
        let provider = TrigramEmbeddings::new(384);
        let a = provider.embed("the capital of Francia is Lutetia").await.unwrap();
        let b = provider.embed("what is the capital of Francia").await.unwrap();
        let c = provider.embed("seventeen purple elephants dancing").await.unwrap();

        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(a, b)| a * b).sum() };
        assert!(dot(&a, &b) > dot(&c, &b));
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let provider = TrigramEmbeddings::new(384);
        let embedding = provider
            .embed("questo è un documento 📄 in italiano")
            .await
            .unwrap();
        assert_eq!(embedding.len(), 384);
    }
}

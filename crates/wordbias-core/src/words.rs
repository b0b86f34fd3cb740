// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Word Lists
// ─────────────────────────────────────────────────────────────────────
//! Case-form expansion, vocabulary filtering and seeded sampling.

use std::collections::{BTreeSet, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use wordbias_types::{BiasError, BiasResult};

use crate::store::EmbeddingStore;

/// `[lower, UPPER, Title]` forms of `word`.
pub fn generate_one_word_forms(word: &str) -> [String; 3] {
    [word.to_lowercase(), word.to_uppercase(), title_case(word)]
}

/// Sorted, de-duplicated union of `words` and all their case forms.
pub fn generate_words_forms<W: AsRef<str>>(words: &[W]) -> Vec<String> {
    let mut forms = BTreeSet::new();
    for word in words.iter().map(AsRef::as_ref) {
        forms.insert(word.to_string());
        forms.extend(generate_one_word_forms(word));
    }
    forms.into_iter().collect()
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_start = true;
    for c in word.chars() {
        if c.is_alphabetic() {
            if at_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_start = false;
        } else {
            out.push(c);
            at_start = true;
        }
    }
    out
}

/// Sorted vocabulary tokens that are not specific words, in any case form.
pub fn extract_neutral_words<S, W>(store: &S, specific_words: &[W]) -> Vec<String>
where
    S: EmbeddingStore + ?Sized,
    W: AsRef<str>,
{
    let excluded: HashSet<String> = generate_words_forms(specific_words).into_iter().collect();
    let mut neutral: Vec<String> = store
        .tokens()
        .filter(|t| !excluded.contains(*t))
        .map(str::to_string)
        .collect();
    neutral.sort();
    neutral
}

/// Words present in the store, order kept.
pub fn filter_words_by_store<S, W>(store: &S, words: &[W]) -> Vec<String>
where
    S: EmbeddingStore + ?Sized,
    W: AsRef<str>,
{
    words
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| store.contains(w))
        .map(str::to_string)
        .collect()
}

/// `n` distinct words sampled without replacement, reproducible by `seed`.
pub fn sample_words<W: AsRef<str>>(words: &[W], n: usize, seed: u64) -> BiasResult<Vec<String>> {
    if n > words.len() {
        return Err(BiasError::InvalidConfiguration(format!(
            "cannot sample {n} words out of {}",
            words.len()
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(words
        .choose_multiple(&mut rng, n)
        .map(|w| w.as_ref().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::axis_store;

    #[test]
    fn test_one_word_forms() {
        assert_eq!(generate_one_word_forms("heRo"), ["hero", "HERO", "Hero"]);
        assert_eq!(
            generate_one_word_forms("ex_wife"),
            ["ex_wife", "EX_WIFE", "Ex_Wife"]
        );
    }

    #[test]
    fn test_words_forms_sorted_unique() {
        let forms = generate_words_forms(&["he", "He"]);
        assert_eq!(forms, vec!["HE", "He", "he"]);
    }

    #[test]
    fn test_extract_neutral_words() {
        let store = axis_store();
        let neutral = extract_neutral_words(&store, &["SHE", "He", "her", "his", "woman", "man"]);
        assert!(!neutral.contains(&"she".to_string()));
        assert!(!neutral.contains(&"he".to_string()));
        assert!(neutral.contains(&"nurse".to_string()));
        let mut sorted = neutral.clone();
        sorted.sort();
        assert_eq!(neutral, sorted);
        assert_eq!(neutral.len(), store.len() - 6);
    }

    #[test]
    fn test_filter_words_by_store() {
        let store = axis_store();
        let kept = filter_words_by_store(&store, &["nurse", "astronaut", "doctor"]);
        assert_eq!(kept, vec!["nurse", "doctor"]);
    }

    #[test]
    fn test_sample_words_seeded() {
        let words: Vec<String> = (0..50).map(|i| format!("w{i}")).collect();
        let a = sample_words(&words, 10, 42).unwrap();
        let b = sample_words(&words, 10, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iter().collect::<HashSet<_>>().len(), 10);
        assert!(sample_words(&words, 51, 42).is_err());
        assert!(sample_words(&words, 0, 1).unwrap().is_empty());
    }
}

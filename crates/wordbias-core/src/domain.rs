// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Bias Domains
// ─────────────────────────────────────────────────────────────────────
//! A bias domain bundles the word tables one audit needs: poles,
//! definitional pairs, specific (legitimately biased) words and named
//! word groups such as professions.
//!
//! Domains are plain data and load from JSON; `BiasDomain::gender()`
//! ships the Bolukbasi et al. (2016) definitional pairs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use wordbias_types::{BiasError, BiasResult, DirectionMethod};

use crate::direction::Definitional;
use crate::store::EmbeddingStore;
use crate::words::{
    extract_neutral_words, filter_words_by_store, generate_one_word_forms, generate_words_forms,
};

/// Group name of all profession words.
pub const PROFESSIONS: &str = "profession_names";
/// Group name of professions without a gendered form.
pub const NEUTRAL_PROFESSIONS: &str = "neutral_profession_names";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasDomain {
    pub name: String,
    pub positive_end: String,
    pub negative_end: String,
    pub definitional_pairs: Vec<(String, String)>,
    #[serde(default)]
    pub direction_method: DirectionMethod,
    /// Words whose association with the direction is legitimate.
    #[serde(default)]
    pub specific_words: Vec<String>,
    #[serde(default)]
    pub word_groups: BTreeMap<String, Vec<String>>,
}

impl BiasDomain {
    pub fn from_json(json: &str) -> BiasResult<Self> {
        let domain: Self =
            serde_json::from_str(json).map_err(|e| BiasError::Config(e.to_string()))?;
        domain.validate()?;
        Ok(domain)
    }

    pub fn validate(&self) -> BiasResult<()> {
        if self.positive_end == self.negative_end {
            return Err(BiasError::InvalidConfiguration(format!(
                "domain {:?} has identical poles {:?}",
                self.name, self.positive_end
            )));
        }
        if self.definitional_pairs.is_empty() {
            return Err(BiasError::InvalidConfiguration(format!(
                "domain {:?} has no definitional pairs",
                self.name
            )));
        }
        Ok(())
    }

    /// Definitional words shaped for `direction_method`.
    pub fn definitional(&self) -> Definitional {
        match self.direction_method {
            DirectionMethod::Single => match self.definitional_pairs.first() {
                Some((a, b)) => Definitional::pair(a.clone(), b.clone()),
                None => Definitional::Pairs(Vec::new()),
            },
            DirectionMethod::Sum => Definitional::groups(
                self.definitional_pairs.iter().map(|(a, _)| a.clone()),
                self.definitional_pairs.iter().map(|(_, b)| b.clone()),
            ),
            DirectionMethod::Pca => Definitional::Pairs(self.definitional_pairs.clone()),
        }
    }

    /// Resolve the domain's word tables against `store`.
    pub fn prepare<S: EmbeddingStore + ?Sized>(&self, store: &S, only_lower: bool) -> PreparedDomain {
        let mut specific: Vec<String> = self.specific_words.clone();
        specific.extend(
            self.definitional_pairs
                .iter()
                .flat_map(|(a, b)| [a.clone(), b.clone()]),
        );
        let specific_words = if only_lower {
            let unique: BTreeSet<String> = specific.into_iter().collect();
            unique.into_iter().collect()
        } else {
            generate_words_forms(&specific)
        };

        let word_groups = self
            .word_groups
            .iter()
            .map(|(name, words)| {
                let mut present = filter_words_by_store(store, words);
                present.sort();
                (name.clone(), present)
            })
            .collect();

        let neutral_words = extract_neutral_words(store, &specific_words);
        let equality_sets = self.equality_sets(store, only_lower);
        log::debug!(
            "domain {}: {} specific, {} neutral, {} equality sets",
            self.name,
            specific_words.len(),
            neutral_words.len(),
            equality_sets.len()
        );

        PreparedDomain {
            domain: self.clone(),
            specific_words,
            word_groups,
            neutral_words,
            equality_sets,
        }
    }

    /// Definitional pairs, zipped across case forms unless `only_lower`,
    /// keeping only pairs fully present in `store`.
    fn equality_sets<S: EmbeddingStore + ?Sized>(&self, store: &S, only_lower: bool) -> Vec<Vec<String>> {
        let mut sets = BTreeSet::new();
        for (a, b) in &self.definitional_pairs {
            if only_lower {
                sets.insert((a.clone(), b.clone()));
            } else {
                let forms = generate_one_word_forms(a).into_iter().zip(generate_one_word_forms(b));
                sets.extend(forms);
            }
        }
        sets.into_iter()
            .filter(|(a, b)| store.contains(a) && store.contains(b))
            .map(|(a, b)| vec![a, b])
            .collect()
    }

    /// Gender domain with the Bolukbasi et al. definitional pairs.
    pub fn gender() -> Self {
        let pairs = [
            ("she", "he"),
            ("her", "his"),
            ("woman", "man"),
            ("Mary", "John"),
            ("herself", "himself"),
            ("daughter", "son"),
            ("mother", "father"),
            ("gal", "guy"),
            ("girl", "boy"),
            ("female", "male"),
        ];
        let specific = [
            "actress", "actor", "aunt", "uncle", "bride", "groom", "brother", "sister",
            "businessman", "businesswoman", "chairman", "chairwoman", "congressman",
            "congresswoman", "dad", "mom", "daughters", "sons", "fiance", "fiancee", "gals",
            "guys", "girls", "boys", "grandfather", "grandmother", "granddaughter", "grandson",
            "heroine", "hero", "husband", "wife", "king", "queen", "ladies", "gentlemen", "lady",
            "gentleman", "males", "females", "men", "women", "mothers", "fathers", "nephew",
            "niece", "prince", "princess", "schoolboy", "schoolgirl", "sisters", "brothers",
            "spokesman", "spokeswoman", "stepfather", "stepmother", "waiter", "waitress",
            "widow", "widower",
        ];
        let professions = [
            "accountant", "architect", "artist", "assistant", "astronaut", "baker", "banker",
            "carpenter", "cashier", "chef", "clerk", "dancer", "dentist", "designer", "doctor",
            "economist", "editor", "electrician", "engineer", "firefighter", "homemaker",
            "housekeeper", "janitor", "journalist", "lawyer", "librarian", "maestro", "manager",
            "mechanic", "musician", "nanny", "nurse", "pharmacist", "philosopher", "photographer",
            "physicist", "pilot", "plumber", "poet", "programmer", "professor", "receptionist",
            "scientist", "secretary", "singer", "soldier", "stylist", "surgeon", "teacher",
            "writer", "actress", "actor", "businessman", "businesswoman", "waiter", "waitress",
        ];
        let gendered: BTreeSet<&str> = specific.iter().copied().collect();
        let neutral_professions: Vec<String> = professions
            .iter()
            .filter(|p| !gendered.contains(*p))
            .map(|p| p.to_string())
            .collect();

        let mut word_groups = BTreeMap::new();
        word_groups.insert(
            PROFESSIONS.to_string(),
            professions.iter().map(|p| p.to_string()).collect(),
        );
        word_groups.insert(NEUTRAL_PROFESSIONS.to_string(), neutral_professions);

        Self {
            name: "gender".to_string(),
            positive_end: "she".to_string(),
            negative_end: "he".to_string(),
            definitional_pairs: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            direction_method: DirectionMethod::Pca,
            specific_words: specific.iter().map(|w| w.to_string()).collect(),
            word_groups,
        }
    }
}

/// A domain resolved against one store.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDomain {
    pub domain: BiasDomain,
    /// Specific and definitional words, case-expanded unless `only_lower`.
    pub specific_words: Vec<String>,
    /// Named groups restricted to words in the store, sorted.
    pub word_groups: BTreeMap<String, Vec<String>>,
    /// Sorted vocabulary words that are not specific.
    pub neutral_words: Vec<String>,
    /// Default equality sets for equalize.
    pub equality_sets: Vec<Vec<String>>,
}

impl PreparedDomain {
    pub fn group(&self, name: &str) -> BiasResult<&[String]> {
        self.word_groups
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| BiasError::InvalidConfiguration(format!("unknown word group {name:?}")))
    }
}

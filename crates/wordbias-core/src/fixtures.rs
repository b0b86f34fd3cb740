// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Test Embeddings
// ─────────────────────────────────────────────────────────────────────
//! Small deterministic embeddings shared by the unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::store::InMemoryEmbedding;

/// `{"he": [1, 0], "she": [-1, 0], "nurse": [0.5, 0.5]}`.
pub(crate) fn toy_store() -> InMemoryEmbedding {
    InMemoryEmbedding::from_rows(
        ["he", "she", "nurse"],
        [vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.5, 0.5]],
    )
    .unwrap()
}

/// Six-dimensional store where gendered pairs differ only along axis 0
/// (female positive), and `x_i`/`y_i` differ along their own axis `i`.
pub(crate) fn axis_store() -> InMemoryEmbedding {
    let mut store = InMemoryEmbedding::new(6).unwrap();
    let gendered = [
        ("she", "he", 0.6, [0.0, 0.5, 0.2, 0.1, 0.0, 0.3]),
        ("her", "his", 0.5, [0.0, 0.1, 0.6, 0.2, 0.1, 0.0]),
        ("woman", "man", 0.7, [0.0, 0.3, 0.1, 0.5, 0.2, 0.1]),
    ];
    for (female, male, amount, base) in gendered {
        let mut f = base.to_vec();
        let mut m = base.to_vec();
        f[0] += amount;
        m[0] -= amount;
        store.insert(female, f).unwrap();
        store.insert(male, m).unwrap();
    }
    for axis in 1..=3 {
        let mut x = vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut y = x.clone();
        x[axis] = 0.5;
        y[axis] = -0.5;
        store.insert(format!("x{axis}"), x).unwrap();
        store.insert(format!("y{axis}"), y).unwrap();
    }
    let neutral = [
        ("nurse", [0.45, 0.4, 0.3, 0.2, 0.1, 0.5]),
        ("receptionist", [0.35, 0.2, 0.4, 0.3, 0.3, 0.1]),
        ("softball", [0.25, 0.6, 0.1, 0.1, 0.4, 0.2]),
        ("football", [-0.3, 0.6, 0.1, 0.2, 0.4, 0.2]),
        ("engineer", [-0.4, 0.1, 0.5, 0.4, 0.2, 0.3]),
        ("maestro", [-0.2, 0.3, 0.3, 0.1, 0.6, 0.2]),
        ("doctor", [-0.05, 0.3, 0.4, 0.4, 0.2, 0.4]),
        ("teacher", [0.1, 0.2, 0.5, 0.3, 0.1, 0.4]),
    ];
    for (word, v) in neutral {
        store.insert(word, v.to_vec()).unwrap();
    }
    store
}

/// A seeded random embedding with a planted bias axis (axis 0).
pub(crate) struct Gendered {
    pub store: InMemoryEmbedding,
    pub pairs: Vec<(String, String)>,
    pub neutral: Vec<String>,
}

/// `n_pairs` female/male pairs `f{i}`/`m{i}` separated along axis 0 with
/// a little noise, plus `n_neutral` words `w{i}` leaning randomly on it.
pub(crate) fn gendered_store(seed: u64, n_pairs: usize, n_neutral: usize, dim: usize) -> Gendered {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = InMemoryEmbedding::new(dim).unwrap();
    let mut pairs = Vec::with_capacity(n_pairs);
    for i in 0..n_pairs {
        let base: Vec<f64> = (0..dim)
            .map(|j| if j == 0 { 0.0 } else { rng.gen_range(-1.0..1.0) })
            .collect();
        let amount = rng.gen_range(0.4..0.8);
        let mut f: Vec<f64> = base.iter().map(|x| x + rng.gen_range(-0.03..0.03)).collect();
        let mut m: Vec<f64> = base.iter().map(|x| x + rng.gen_range(-0.03..0.03)).collect();
        f[0] += amount;
        m[0] -= amount;
        let (fw, mw) = (format!("f{i}"), format!("m{i}"));
        store.insert(fw.clone(), f).unwrap();
        store.insert(mw.clone(), m).unwrap();
        pairs.push((fw, mw));
    }
    let mut neutral = Vec::with_capacity(n_neutral);
    for i in 0..n_neutral {
        let mut v: Vec<f64> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
        v[0] += rng.gen_range(-0.5..0.5);
        let word = format!("w{i}");
        store.insert(word.clone(), v).unwrap();
        neutral.push(word);
    }
    Gendered {
        store,
        pairs,
        neutral,
    }
}

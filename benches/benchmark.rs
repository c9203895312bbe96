use criterion::{black_box, criterion_group, criterion_main, Criterion};
use knn_classifier::{KnnClassifier, Similarity, WeightScheme};

const CATEGORIES: [&str; 4] = ["sport", "science", "finance", "travel"];

/// xorshift so the corpus is identical between runs
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

/// Documents drawn from a per-category vocabulary with some shared noise words
fn synthetic_corpus(docs: usize, words_per_doc: usize) -> Vec<(String, &'static str)> {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    (0..docs)
        .map(|i| {
            let category = CATEGORIES[i % CATEGORIES.len()];
            let doc = (0..words_per_doc)
                .map(|_| {
                    let r = rng.next();
                    if r % 4 == 0 {
                        format!("noise{}", r % 200)
                    } else {
                        format!("{}{}", category, r % 500)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            (doc, category)
        })
        .collect()
}

fn train_and_classify_benchmark(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000, 60);
    let queries = synthetic_corpus(32, 20);

    c.bench_function("train_2000_docs", |b| {
        b.iter(|| {
            let knn = KnnClassifier::new();
            for (doc, category) in &corpus {
                knn.train_str(doc, category).unwrap();
            }
            knn
        });
    });

    for similarity in Similarity::ALL {
        let knn = KnnClassifier::builder()
            .k(5)
            .weight_scheme(WeightScheme::TermFrequency)
            .similarity(similarity)
            .build()
            .unwrap();
        for (doc, category) in &corpus {
            knn.train_str(doc, category).unwrap();
        }

        c.bench_function(&format!("classify_{}", similarity), |b| {
            b.iter(|| {
                for (query, _) in &queries {
                    black_box(knn.classify_str(black_box(query)).unwrap());
                }
            });
        });
    }
}

criterion_group!(benches, train_and_classify_benchmark);
criterion_main!(benches);

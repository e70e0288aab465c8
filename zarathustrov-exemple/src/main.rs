use rand::SeedableRng;
use rand::rngs::StdRng;

use zarathustrov_core::model::cache;
use zarathustrov_core::{CorpusRange, Generator, GeneratorConfig, ModelError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Corpus path, defaults to "./data/corpus.txt"
    let corpus = std::env::args().nth(1).unwrap_or_else(|| "./data/corpus.txt".to_owned());

    // Only learn from this byte window, e.g. to skip a preface and an afterword.
    // 'CorpusRange::full()' reads the whole file
    let range = CorpusRange::new(0, None);

    // Build the tree, or load it from "./data/corpus.bin" if it was built with the same window
    let tree = cache::load_or_build(&corpus, range)?;
    println!("{} keys, {} transitions", tree.len(), tree.total());

    // Write the tree as JSON to inspect it
    tree.write_snapshot("./data/tree.json")?;

    // Posts are at most 280 bytes, end on '.', '!' or '?',
    // and the listed words are always capitalized
    let config = GeneratorConfig { max_len: 280, max_attempts: 64, ..GeneratorConfig::default() }
        .with_proper_nouns(["i", "zarathustra"]);

    // Fails with 'DegenerateTree' if the corpus produced no word pairs
    let generator = match Generator::new(&tree, config) {
        Ok(generator) => generator,
        Err(ModelError::DegenerateTree) => {
            println!("The corpus is empty, nothing to generate");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // A fixed seed always produces the same posts
    let mut rng = StdRng::seed_from_u64(42);

    // Generate 10 posts
    for i in 0..10 {
        println!("Generated post {}: {}", i + 1, generator.generate(&mut rng)?);
    }

    // A single attempt may fail to complete a sentence: 'generate' retries, 'attempt' does not
    match generator.attempt(&mut rng)? {
        Some(text) => println!("Single attempt: {}", text),
        None => println!("Single attempt reached the length bound without a full sentence"),
    }

    Ok(())
}

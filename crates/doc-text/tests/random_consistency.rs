//! Random edit consistency tests
//!
//! Apply many random replacements to the tree-backed storage and to a `ropey::Rope` and check that
//! text, line count, line spans and position lookups agree after every materialization.

use doc_text::{LineIndex, StorageConfig, TextStorage, VersionCacheConfig};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ropey::Rope;

const INSERTS: &[&str] = &[
    "x",
    "你好",
    "👋",
    "line\n",
    "\n",
    "\r\n",
    "\r",
    "cr\r",
    "a\r\nb\r\n",
    "\n\n\n",
    "tail without break",
    "\u{2028}",
    "fn main() {\n    println!(\"hi\");\n}\n",
];

fn seed_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("{i:04} lorem ipsum dolor sit amet\n"))
        .collect()
}

fn random_edit(rng: &mut StdRng, len: usize) -> (usize, usize, String) {
    let start = rng.gen_range(0..=len);
    let delete_len = if rng.gen_bool(0.5) {
        rng.gen_range(0..=(len - start).min(40))
    } else {
        0
    };
    let insert = if rng.gen_bool(0.8) {
        let count = rng.gen_range(1..=3);
        (0..count)
            .map(|_| INSERTS[rng.gen_range(0..INSERTS.len())])
            .collect()
    } else {
        String::new()
    };
    (start, delete_len, insert)
}

fn assert_matches_rope(storage: &mut TextStorage, rope: &Rope) {
    assert_eq!(storage.text().unwrap(), rope.to_string());
    assert_eq!(storage.char_count().unwrap(), rope.len_chars());
    assert_eq!(storage.line_count().unwrap(), rope.len_lines());

    for line in 0..rope.len_lines() {
        let span = storage.line_to_text_span(line).unwrap();
        assert_eq!(span.start, rope.line_to_char(line), "start of line {line}");
        assert_eq!(span.length, rope.line(line).len_chars(), "length of line {line}");
    }

    let step = (rope.len_chars() / 50).max(1);
    for position in (0..=rope.len_chars()).step_by(step) {
        let offset = storage.position_to_line_offset(position).unwrap();
        let line = rope.char_to_line(position);
        assert_eq!(offset.line, line + 1, "line of {position}");
        assert_eq!(offset.column, position - rope.line_to_char(line) + 1, "offset of {position}");
    }
}

#[test]
fn test_random_edits_match_rope() {
    let config = StorageConfig {
        cache: VersionCacheConfig::default().with_check_edits(true),
        ..StorageConfig::default()
    };

    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = seed_text(40);
        let mut storage = TextStorage::from_text(text.as_str(), config);
        storage.open(None).unwrap();
        let mut rope = Rope::from_str(&text);

        for step in 0..200 {
            let (start, delete_len, insert) = random_edit(&mut rng, rope.len_chars());
            storage.edit(start, start + delete_len, &insert).unwrap();
            rope.remove(start..start + delete_len);
            rope.insert(start, &insert);

            if step % 17 == 0 {
                assert_matches_rope(&mut storage, &rope);
            }
        }
        assert_matches_rope(&mut storage, &rope);
    }
}

#[test]
fn test_random_edits_keep_tree_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut index = LineIndex::from_text(&seed_text(200));
    let mut reference = Rope::from_str(&index.text());

    for _ in 0..500 {
        let (start, delete_len, insert) = random_edit(&mut rng, reference.len_chars());
        index = index.edit(start, delete_len, &insert).unwrap();
        reference.remove(start..start + delete_len);
        reference.insert(start, &insert);

        index.check_invariants().unwrap();
        assert_eq!(index.char_count(), reference.len_chars());
        assert_eq!(index.document_line_count(), reference.len_lines());
    }
    assert_eq!(index.text(), reference.to_string());
}

#[test]
fn test_old_versions_survive_random_edits() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut index = LineIndex::from_text(&seed_text(64));
    let mut history = vec![(index.clone(), index.text())];

    for _ in 0..50 {
        let (start, delete_len, insert) = random_edit(&mut rng, index.char_count());
        index = index.edit(start, delete_len, &insert).unwrap();
        history.push((index.clone(), index.text()));
    }

    for (tree, text) in &history {
        assert_eq!(&tree.text(), text);
    }
}

#[test]
fn test_empty_document_edits() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut storage = TextStorage::from_text("", StorageConfig::default());
    let mut rope = Rope::new();

    for _ in 0..100 {
        let len = rope.len_chars();
        let (start, delete_len) = if rng.gen_bool(0.3) { (0, len) } else { (len, 0) };
        let insert = INSERTS[rng.gen_range(0..INSERTS.len())];
        storage.edit(start, start + delete_len, insert).unwrap();
        rope.remove(start..start + delete_len);
        rope.insert(start, insert);
        assert_eq!(storage.line_count().unwrap(), rope.len_lines());
    }
    assert_matches_rope(&mut storage, &rope);
}

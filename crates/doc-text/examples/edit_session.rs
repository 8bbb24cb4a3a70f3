//! Edit session example
//!
//! Opens a document, applies a burst of edits, and asks what changed since the first version.

use doc_text::{ChangeRange, StorageConfig, TextStorage};

fn main() {
    println!("=== doc-text edit session ===\n");

    let mut storage = TextStorage::from_text(
        "fn main() {\n    println!(\"Hello, World!\");\n}\n",
        StorageConfig::default(),
    );
    storage.open(None).unwrap();

    let initial = storage.version().unwrap();
    println!("1. Initial document ({initial:?}):");
    print_lines(&mut storage);

    println!("\n2. Typing a new statement one char at a time:");
    let insert_at = storage.line_offset_to_position(3, 1).unwrap();
    let statement = "    let answer = 42;\n";
    for (i, c) in statement.chars().enumerate() {
        let pos = insert_at + i;
        storage.edit(pos, pos, &c.to_string()).unwrap();
    }
    let after_typing = storage.version().unwrap();
    println!("  version after {} edits: {after_typing:?}", statement.chars().count());

    println!("\n3. Renaming `main` to `run`:");
    storage.edit(3, 7, "run").unwrap();
    print_lines(&mut storage);

    println!("\n4. Change ranges:");
    for (label, old) in [("since open", initial), ("since typing", after_typing)] {
        match storage.change_range(old).unwrap() {
            ChangeRange::Changed(range) => println!(
                "  {label}: old [{}, {}) replaced by {} chars",
                range.span.start,
                range.span.end(),
                range.new_length
            ),
            ChangeRange::Unchanged => println!("  {label}: unchanged"),
            ChangeRange::Unavailable => println!("  {label}: unavailable, diff the full text"),
        }
    }

    println!("\n5. Position lookups:");
    for position in [0, 12, 30, storage.char_count().unwrap()] {
        let offset = storage.position_to_line_offset(position).unwrap();
        println!("  {position:>3} -> line {}, offset {}", offset.line, offset.column);
    }
}

fn print_lines(storage: &mut TextStorage) {
    let line_count = storage.line_count().unwrap();
    for line in 0..line_count {
        let span = storage.line_to_text_span(line).unwrap();
        let text = storage.get_snapshot_text(span.start, span.end()).unwrap();
        println!("  {:>2} | {}", line + 1, text.trim_end_matches(['\r', '\n']));
    }
}

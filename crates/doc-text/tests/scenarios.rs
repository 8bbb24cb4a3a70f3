//! End-to-end behaviour of the storage and the version cache on small documents.

use doc_text::{
    ChangeRange, LineOffset, StorageConfig, TextChangeRange, TextSpan, TextStorage, VersionCache,
    VersionCacheConfig,
};
use pretty_assertions::assert_eq;

fn checked_config() -> StorageConfig {
    StorageConfig {
        cache: VersionCacheConfig::default().with_check_edits(true),
        ..StorageConfig::default()
    }
}

fn open_storage(text: &str) -> TextStorage {
    let mut storage = TextStorage::from_text(text, checked_config());
    storage.open(None).unwrap();
    storage
}

#[test]
fn test_line_spans_and_offsets() {
    for mut storage in [
        TextStorage::from_text("abc\ndef\n", checked_config()),
        open_storage("abc\ndef\n"),
    ] {
        assert_eq!(storage.line_to_text_span(0).unwrap(), TextSpan::new(0, 4));
        assert_eq!(
            storage.position_to_line_offset(5).unwrap(),
            LineOffset { line: 2, column: 2 }
        );
        assert_eq!(storage.get_snapshot_text(0, 4).unwrap(), "abc\n");
    }
}

#[test]
fn test_replace_inside_line() {
    let mut storage = TextStorage::from_text("hello world", checked_config());
    storage.edit(5, 6, ", ").unwrap();
    assert_eq!(storage.text().unwrap(), "hello, world");
    assert_eq!(storage.line_count().unwrap(), 1);
}

#[test]
fn test_delete_whole_line() {
    let mut storage = open_storage("line1\nline2\nline3");
    storage.edit(6, 12, "").unwrap();
    assert_eq!(storage.text().unwrap(), "line1\nline3");
    assert_eq!(storage.line_count().unwrap(), 2);
    assert_eq!(storage.line_to_text_span(1).unwrap(), TextSpan::new(6, 5));
}

#[test]
fn test_small_edits_materialize_automatically() {
    let mut cache = VersionCache::from_text("", VersionCacheConfig::default().with_check_edits(true));
    for i in 0..10 {
        cache.edit(i, 0, "a").unwrap();
    }
    assert_eq!(cache.current_version(), 1);
    assert_eq!(cache.pending_changes().len(), 1);

    let mut storage = open_storage("");
    let before = storage.version().unwrap();
    for i in 0..10 {
        storage.edit(i, i, "a").unwrap();
    }
    let after = storage.version().unwrap();
    assert_eq!(after.generation, before.generation);
    assert_eq!(after.snapshot, before.snapshot + 2);
    assert_eq!(storage.text().unwrap(), "a".repeat(10));
}

#[test]
fn test_version_is_idempotent_and_monotonic() {
    let mut storage = open_storage("fn main() {}\n");
    let mut last = storage.version().unwrap();
    assert_eq!(storage.version().unwrap(), last);

    for step in 0..20 {
        if step % 3 != 0 {
            storage.edit(0, 0, "//").unwrap();
        }
        let version = storage.version().unwrap();
        if step % 3 == 0 {
            assert_eq!(version, last);
        } else {
            assert!(version > last);
        }
        last = version;
    }
}

#[test]
fn test_evicted_versions_are_unavailable() {
    let mut storage = open_storage("x");
    let first = storage.version().unwrap();
    let mut versions = vec![first];
    for i in 0..12 {
        storage.edit(i + 1, i + 1, "y").unwrap();
        versions.push(storage.version().unwrap());
    }

    // 12 materialized edits with a ring of 8: versions 0..=4 are gone.
    for old in &versions[..5] {
        assert_eq!(storage.change_range(*old).unwrap(), ChangeRange::Unavailable);
    }
    assert_eq!(
        storage.change_range(versions[5]).unwrap(),
        ChangeRange::Changed(TextChangeRange::new(TextSpan::new(6, 0), 7))
    );
    assert_eq!(storage.change_range(versions[12]).unwrap(), ChangeRange::Unchanged);
}

#[test]
fn test_change_range_covers_all_edits() {
    let mut storage = open_storage("let a = 1;\nlet b = 2;\nlet c = 3;\n");
    let old = storage.version().unwrap();
    let old_text = storage.text().unwrap();

    storage.edit(15, 16, "x").unwrap();
    storage.version().unwrap();
    storage.edit(4, 5, "alpha").unwrap();
    storage.version().unwrap();
    storage.edit(30, 31, "").unwrap();
    let new_text = storage.text().unwrap();

    let range = storage.change_range(old).unwrap().changed().unwrap();
    let old_old: String = old_text.chars().skip(range.span.end()).collect();
    let new_new: String = new_text.chars().skip(range.new_end()).collect();
    assert_eq!(old_old, new_new);

    let prefix_old: String = old_text.chars().take(range.span.start).collect();
    let prefix_new: String = new_text.chars().take(range.span.start).collect();
    assert_eq!(prefix_old, prefix_new);
}

#[test]
fn test_line_offset_inverse() {
    let text = "first\r\nsecond\rthird\n\u{2028}ünïcödé\u{2029}\nlast";
    let mut plain = TextStorage::from_text(text, checked_config());
    let mut versioned = open_storage(text);
    let char_count = text.chars().count();

    for storage in [&mut plain, &mut versioned] {
        for position in 0..=char_count {
            let offset = storage.position_to_line_offset(position).unwrap();
            assert_eq!(
                storage
                    .line_offset_to_position(offset.line, offset.column)
                    .unwrap(),
                position,
                "position {position} -> {offset:?}"
            );
        }
    }
}

#[test]
fn test_plain_and_versioned_agree() {
    let text = "alpha\n\nbeta\r\ngamma\rdelta\n";
    let mut plain = TextStorage::from_text(text, checked_config());
    let mut versioned = open_storage(text);

    let line_count = plain.line_count().unwrap();
    assert_eq!(versioned.line_count().unwrap(), line_count);
    for line in 0..line_count {
        assert_eq!(
            plain.line_to_text_span(line).unwrap(),
            versioned.line_to_text_span(line).unwrap(),
            "line {line}"
        );
    }
    assert!(plain.line_to_text_span(line_count).is_err());
    assert!(versioned.line_to_text_span(line_count).is_err());

    for position in 0..=text.chars().count() {
        assert_eq!(
            plain.position_to_line_offset(position).unwrap(),
            versioned.position_to_line_offset(position).unwrap()
        );
    }
}

#[test]
fn test_edits_after_append_and_crlf() {
    let mut storage = open_storage("a\r");
    storage.edit(2, 2, "\nb").unwrap();
    assert_eq!(storage.text().unwrap(), "a\r\nb");
    assert_eq!(storage.line_count().unwrap(), 2);
    assert_eq!(storage.line_to_text_span(0).unwrap(), TextSpan::new(0, 3));

    storage.edit(4, 4, "\n").unwrap();
    assert_eq!(storage.line_count().unwrap(), 3);
    assert_eq!(
        storage.position_to_line_offset(5).unwrap(),
        LineOffset { line: 3, column: 1 }
    );
}

#[test]
fn test_insert_after_lone_cr_matches_plain() {
    let mut versioned = open_storage("a\rb");
    versioned.edit(2, 2, "x").unwrap();
    let mut plain = TextStorage::from_text("a\rxb", checked_config());

    for storage in [&mut versioned, &mut plain] {
        assert_eq!(storage.text().unwrap(), "a\rxb");
        assert_eq!(storage.line_count().unwrap(), 2);
        assert_eq!(storage.line_to_text_span(0).unwrap(), TextSpan::new(0, 2));
        assert_eq!(storage.line_to_text_span(1).unwrap(), TextSpan::new(2, 2));
    }
}

//! Property-based tests for block moves
//!
//! 1. **Moves permute**: a successful move yields the block list with the
//!    source removed and re-inserted at the target, nothing else changes.
//! 2. **No self drop**: a target inside the source block or at either of its
//!    edges never mutates.
//! 3. **Atomicity**: any request either commits exactly once or leaves the
//!    document untouched.
//! 4. **Targets are boundaries**: every resolved drop target is a block
//!    boundary, whatever the pointer position.

use blockshift_engine::{
    BlockLayout, Document, MemoryEditor, MoveRequest, Node, ReorderError, execute,
    resolve_drop_target,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// Paragraphs named `b0`, `b1`, ... padded to the given text lengths
fn document(lengths: &[usize]) -> Document {
    Document::new(
        lengths
            .iter()
            .enumerate()
            .map(|(index, len)| Node::paragraph(format!("b{index}{}", "x".repeat(*len))))
            .collect(),
    )
}

fn names(doc: &Document) -> Vec<String> {
    doc.block_texts()
        .into_iter()
        .map(|text| text.trim_end_matches('x').to_string())
        .collect()
}

fn lengths() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..6, 2..8)
}

/// Block list with a source block index and a target boundary index
fn move_case() -> impl Strategy<Value = (Vec<usize>, usize, usize)> {
    lengths().prop_flat_map(|lengths| {
        let n = lengths.len();
        (Just(lengths), 0..n, 0..=n)
    })
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn moves_permute_blocks((lengths, source, boundary) in move_case()) {
        prop_assume!(boundary != source && boundary != source + 1);

        let doc = document(&lengths);
        let request = MoveRequest {
            source_position: doc.block_start(source).unwrap(),
            source_size: doc.blocks()[source].size(),
            target_position: doc.block_start(boundary).unwrap(),
        };
        let mut expected = names(&doc);
        let moved = expected.remove(source);
        let slot = if boundary > source { boundary - 1 } else { boundary };
        expected.insert(slot, moved);

        let mut editor = MemoryEditor::new(doc.clone());
        let outcome = execute(&mut editor, request).unwrap();

        prop_assert_eq!(names(editor.document()), expected);
        prop_assert_eq!(editor.document().size(), doc.size());
        prop_assert_eq!(editor.document().version(), 1);
        prop_assert_eq!(editor.document().block_start(slot), Some(outcome.to));
    }

    #[test]
    fn drops_inside_source_never_mutate(
        (lengths, source, _) in move_case(),
        offset in 0usize..32,
    ) {
        let doc = document(&lengths);
        let start = doc.block_start(source).unwrap();
        let size = doc.blocks()[source].size();
        let request = MoveRequest {
            source_position: start,
            source_size: size,
            target_position: start + offset % (size + 1),
        };

        let mut editor = MemoryEditor::new(doc.clone());
        let result = execute(&mut editor, request);

        let is_drop_inside = matches!(result, Err(ReorderError::DropInsideSource { .. }));
        prop_assert!(is_drop_inside);
        prop_assert_eq!(editor.document(), &doc);
    }

    #[test]
    fn arbitrary_targets_commit_once_or_not_at_all(
        (lengths, source, _) in move_case(),
        target in 0usize..64,
    ) {
        let doc = document(&lengths);
        let request = MoveRequest {
            source_position: doc.block_start(source).unwrap(),
            source_size: doc.blocks()[source].size(),
            target_position: target,
        };

        let mut editor = MemoryEditor::new(doc.clone());
        match execute(&mut editor, request) {
            Ok(_) => {
                prop_assert!(doc.is_boundary(target));
                prop_assert_eq!(editor.document().version(), 1);
                prop_assert_eq!(editor.document().blocks().len(), doc.blocks().len());
            }
            Err(_) => {
                prop_assert_eq!(editor.document(), &doc);
                prop_assert_eq!(editor.selection(), None);
            }
        }
    }

    #[test]
    fn drop_targets_are_boundaries(lengths in lengths(), pointer_y in -100.0f64..600.0) {
        let editor = MemoryEditor::new(document(&lengths));
        let blocks = editor.block_elements();

        let target = resolve_drop_target(&editor, pointer_y, &blocks).unwrap();

        prop_assert!(editor.document().is_boundary(target.position));
        prop_assert!(target.index < lengths.len());
    }
}

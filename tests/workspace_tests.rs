//! Integration tests for the multi-file program cache.
//!
//! These drive the manager entirely through in-memory document updates, the
//! same path the language server uses.

use quakec::workspace::SourceDocumentManager;
use quakec_syntax::ast::Position;
use quakec_syntax::grammar::Dialect;

const MANIFEST: &str = "// Sample QuakeC project\nprogs.dat // output slot\n\ndefs.qc\nitems.qc\nworld.qc\n";

const DEFS: &str = "float deathmatch;\nvector origin;\nvoid() precache;\n";

const ITEMS: &str = "float item_count;\nvoid() touch_item = {\n    item_count = item_count + 1;\n};\n";

const WORLD: &str =
    "void() worldspawn = {\n    if (deathmatch)\n        precache();\n    item_count = 0;\n};\n";

fn project(files: &[(&str, &str)]) -> SourceDocumentManager {
    let mut manager = SourceDocumentManager::new(None);
    for (path, text) in files {
        manager.update_document(path, 1, (*text).to_string());
    }
    manager
}

fn sample_project() -> SourceDocumentManager {
    project(&[
        ("/proj/progs.src", MANIFEST),
        ("/proj/defs.qc", DEFS),
        ("/proj/items.qc", ITEMS),
        ("/proj/world.qc", WORLD),
    ])
}

#[test]
fn test_link_order_comes_from_manifest() {
    let manager = sample_project();
    assert_eq!(
        manager.source_order(),
        ["/proj/defs.qc", "/proj/items.qc", "/proj/world.qc"]
    );
}

#[test]
fn test_no_diagnostics_in_clean_project() {
    let mut manager = sample_project();
    for (uri, diagnostics) in manager.get_diagnostics_all() {
        assert!(diagnostics.is_empty(), "{uri}: {diagnostics:?}");
    }
}

#[test]
fn test_cross_file_hover() {
    let mut manager = sample_project();
    assert_eq!(
        manager.get_hover("/proj/world.qc", Position::new(1, 9)).as_deref(),
        Some("float deathmatch")
    );
    assert_eq!(
        manager.get_hover("/proj/world.qc", Position::new(3, 5)).as_deref(),
        Some("float item_count")
    );
}

#[test]
fn test_cross_file_definition() {
    let mut manager = sample_project();
    let location = manager
        .get_definition("/proj/world.qc", Position::new(2, 9))
        .expect("definition of precache");
    assert_eq!(location.uri, "/proj/defs.qc");
    assert_eq!(location.range.start, Position::new(2, 7));
    assert_eq!(location.range.end, Position::new(2, 15));
}

#[test]
fn test_workspace_wide_references() {
    let mut manager = sample_project();

    let without_declaration = manager.get_references("/proj/items.qc", Position::new(2, 5), false);
    assert_eq!(without_declaration.len(), 3);
    assert_eq!(without_declaration[0].uri, "/proj/items.qc");
    assert_eq!(without_declaration[0].range.start, Position::new(2, 4));
    assert_eq!(without_declaration[1].range.start, Position::new(2, 17));
    assert_eq!(without_declaration[2].uri, "/proj/world.qc");
    assert_eq!(without_declaration[2].range.start, Position::new(3, 4));

    let with_declaration = manager.get_references("/proj/items.qc", Position::new(2, 5), true);
    assert_eq!(with_declaration.len(), 4);
    assert_eq!(with_declaration[0].range.start, Position::new(0, 6));
}

#[test]
fn test_edit_invalidates_downstream_only() {
    let mut manager = sample_project();

    // Editing the middle file re-parses it and everything after it, but not
    // the file before it.
    manager.update_document("/proj/items.qc", 2, ITEMS.to_string().replace("item_count + 1", "item_count + 2"));
    assert_eq!(manager.documents_parsed(), 2);

    manager.update_document("/proj/defs.qc", 2, DEFS.to_string());
    assert_eq!(manager.documents_parsed(), 3);

    manager.update_document("/proj/world.qc", 2, WORLD.to_string());
    assert_eq!(manager.documents_parsed(), 1);
}

#[test]
fn test_stale_versions_are_ignored() {
    let mut manager = sample_project();
    manager.update_document("/proj/defs.qc", 1, "string deathmatch;\n".to_string());
    assert_eq!(manager.document_text("/proj/defs.qc"), Some(DEFS));
    assert_eq!(
        manager.get_hover("/proj/world.qc", Position::new(1, 9)).as_deref(),
        Some("float deathmatch")
    );
}

#[test]
fn test_revalidation_uses_new_upstream_scope() {
    let mut manager = sample_project();
    assert_eq!(
        manager.get_hover("/proj/world.qc", Position::new(1, 9)).as_deref(),
        Some("float deathmatch")
    );

    let retyped = DEFS.replace("float deathmatch;", "entity deathmatch;");
    manager.update_document("/proj/defs.qc", 2, retyped);
    assert_eq!(
        manager.get_hover("/proj/world.qc", Position::new(1, 9)).as_deref(),
        Some("entity deathmatch")
    );
}

#[test]
fn test_manifest_update_rebuilds_everything() {
    let mut manager = sample_project();
    let reordered = "progs.dat\ndefs.qc\nworld.qc\nitems.qc\n";
    manager.update_document("/proj/progs.src", 2, reordered.to_string());
    assert_eq!(manager.documents_parsed(), 3);
    assert_eq!(
        manager.source_order(),
        ["/proj/defs.qc", "/proj/world.qc", "/proj/items.qc"]
    );
}

#[test]
fn test_file_outside_link_order_has_no_parent_scope() {
    let mut manager = project(&[
        ("/proj/progs.src", MANIFEST),
        ("/proj/defs.qc", DEFS),
        ("/proj/items.qc", ITEMS),
        ("/proj/world.qc", WORLD),
        ("/proj/extra.qc", "void() lonely = {\n    deathmatch = 1;\n};\n"),
    ]);

    // `deathmatch` is not visible: extra.qc is not part of the link order.
    assert_eq!(manager.get_definition("/proj/extra.qc", Position::new(1, 5)), None);
    assert_eq!(manager.get_hover("/proj/extra.qc", Position::new(1, 5)), None);
    // Assigning an undefined name is tooling-visible but not an error.
    assert!(manager.get_diagnostics("/proj/extra.qc").is_empty());
}

#[test]
fn test_malformed_file_still_produces_a_program_and_chain_continues() {
    let mut manager = project(&[
        ("/proj/progs.src", "progs.dat\nbad.qc\nuse.qc\n"),
        ("/proj/bad.qc", "float health;\n@@@\nfloat armor;\n"),
        ("/proj/use.qc", "void() f = {\n    armor = health;\n};\n"),
    ]);

    let bad = manager.get_diagnostics("/proj/bad.qc");
    assert_eq!(bad.len(), 3, "{bad:?}");
    assert!(bad.iter().all(|d| d.message.contains("Unexpected token")));

    // Declarations on both sides of the garbage made it into scope.
    assert!(manager.get_diagnostics("/proj/use.qc").is_empty());
    assert_eq!(
        manager.get_hover("/proj/use.qc", Position::new(1, 5)).as_deref(),
        Some("float armor")
    );
    assert_eq!(
        manager.get_hover("/proj/use.qc", Position::new(1, 13)).as_deref(),
        Some("float health")
    );
}

#[test]
fn test_dialect_switch_forces_revalidation() {
    let mut manager = project(&[
        ("/m/progs.src", "progs.dat\nmath.qc\n"),
        ("/m/math.qc", "void() calc = {\n    local float zero = 1-1;\n};\n"),
    ]);

    let qcc = manager.get_diagnostics("/m/math.qc");
    assert_eq!(qcc.len(), 1);
    assert!(qcc[0].message.contains("Missing whitespace for '-' operator."));

    manager.set_dialect(Dialect::Fteqcc);
    assert!(manager.get_diagnostics("/m/math.qc").is_empty());

    manager.set_dialect(Dialect::Qcc);
    assert_eq!(manager.get_diagnostics("/m/math.qc").len(), 1);
}

#[test]
fn test_cache_keys_are_case_insensitive() {
    let mut manager = sample_project();
    assert_eq!(
        manager.get_hover("/proj/WORLD.QC", Position::new(1, 9)).as_deref(),
        Some("float deathmatch")
    );
}

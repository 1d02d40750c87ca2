//! # Catalog Tests
//!
//! Menu catalog lookup, alias handling and menu rendering.

use plant_doctor::catalog::{MenuCatalog, Subject, DEFAULT_RESET_TOKENS};

#[test]
fn test_resolve_is_case_and_whitespace_insensitive() {
    let catalog = MenuCatalog::new(
        vec![
            Subject::new(&["t", "tomato"], "Tomato", "tomato"),
            Subject::new(&["p"], "Potato", "potato"),
        ],
        &[],
    )
    .unwrap();

    assert_eq!(catalog.resolve("  TOMATO ").unwrap().key, "tomato");
    assert_eq!(catalog.resolve("T").unwrap().key, "tomato");
    assert_eq!(catalog.resolve("p").unwrap().key, "potato");
    assert!(catalog.resolve("q").is_none());
    assert!(catalog.resolve("").is_none());
}

#[test]
fn test_default_catalog_aliases() {
    let catalog = MenuCatalog::default();

    for (ascii, bengali) in [("1", "১"), ("5", "৫"), ("7", "৭")] {
        let a = catalog.resolve(ascii).unwrap();
        let b = catalog.resolve(bengali).unwrap();
        assert_eq!(a, b, "{ascii} and {bengali} should select the same subject");
    }

    assert_eq!(catalog.resolve("5").unwrap().display_name, "Tomato");
    assert!(catalog.resolve("0").is_none());
    assert!(catalog.resolve("99").is_none());
    assert!(catalog.resolve("8").is_none());
}

#[test]
fn test_render_menu_lists_each_subject_once_in_order() {
    let catalog = MenuCatalog::default();
    let menu = catalog.render_menu();

    assert_eq!(
        menu,
        "1. Corn\n2. Cotton\n3. Rice\n4. Tea\n5. Tomato\n6. Mango\n7. Potato"
    );
    assert_eq!(menu, catalog.render_menu());
}

#[test]
fn test_render_menu_ignores_alias_spelling() {
    // Aliases that look alike must not produce extra or missing lines
    let catalog = MenuCatalog::new(
        vec![
            Subject::new(&["1", "১", "01"], "Corn", "corn"),
            Subject::new(&["2"], "Cotton", "cotton"),
        ],
        &[],
    )
    .unwrap();

    assert_eq!(catalog.render_menu(), "1. Corn\n2. Cotton");
}

#[test]
fn test_reset_tokens() {
    let catalog = MenuCatalog::default();

    for token in DEFAULT_RESET_TOKENS {
        assert!(catalog.is_reset_token(token), "{token} should reset");
    }
    assert!(catalog.is_reset_token("Hello!"));
    assert!(catalog.is_reset_token(" MENU "));
    assert!(!catalog.is_reset_token("hello there"));
    assert!(!catalog.is_reset_token("5"));
}

#[test]
fn test_subject_by_key() {
    let catalog = MenuCatalog::default();
    assert_eq!(catalog.subject_by_key("mango").unwrap().canonical_token(), "6");
    assert!(catalog.subject_by_key("banana").is_none());
    assert_eq!(catalog.subjects().len(), 7);
}

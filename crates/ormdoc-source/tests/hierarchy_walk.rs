use ormdoc_source::{ArtifactTable, HierarchyError, SourceArtifact};

fn class(path: &str, text: &str) -> SourceArtifact {
    SourceArtifact::scan(path, text)
}

const ENTITY: &str = r#"<?php
namespace App\Entity;

use App\Model\Base;
use App\Traits\Stamp;

class Book extends Base
{
    use Stamp;

    private $title;
}
"#;

const BASE_WITHOUT_HOOK: &str = "<?php\nnamespace App\\Model;\n\nabstract class Base\n{\n}\n";
const BASE_WITH_HOOK: &str =
    "<?php\nnamespace App\\Model;\n\nabstract class Base\n{\n    public function onSave() {}\n}\n";
const TRAIT_WITH_HOOK: &str =
    "<?php\nnamespace App\\Traits;\n\ntrait Stamp\n{\n    public function onSave() {}\n}\n";
const TRAIT_WITHOUT_HOOK: &str = "<?php\nnamespace App\\Traits;\n\ntrait Stamp\n{\n}\n";

fn table(files: &[(&str, &str)]) -> ArtifactTable {
    let artifacts = files.iter().map(|(path, text)| class(path, text)).collect();
    ArtifactTable::build(artifacts, &[])
}

#[test]
fn trait_wins_over_supertype() {
    let table = table(&[
        ("Book.php", ENTITY),
        ("Base.php", BASE_WITH_HOOK),
        ("Stamp.php", TRAIT_WITH_HOOK),
    ]);
    let book = table.lookup("App\\Entity\\Book").unwrap();
    let stamp = table.lookup("App\\Traits\\Stamp").unwrap();
    assert_eq!(table.find_declaring_artifact(book, "onSave").unwrap(), Some(stamp));
}

#[test]
fn falls_back_to_supertype() {
    let table = table(&[
        ("Book.php", ENTITY),
        ("Base.php", BASE_WITH_HOOK),
        ("Stamp.php", TRAIT_WITHOUT_HOOK),
    ]);
    let book = table.lookup("App\\Entity\\Book").unwrap();
    let base = table.lookup("App\\Model\\Base").unwrap();
    assert_eq!(table.find_declaring_artifact(book, "onSave").unwrap(), Some(base));
    assert_eq!(table.find_declaring_artifact(book, "onLoad").unwrap(), None);
}

#[test]
fn supertype_discovered_later_still_links() {
    let table = table(&[("Base.php", BASE_WITHOUT_HOOK), ("Book.php", ENTITY)]);
    let book = table.lookup("app\\entity\\book").unwrap();
    let base = table.lookup("\\App\\Model\\Base").unwrap();
    assert_eq!(table.supertype(book), Some(base));
    // The trait was never discovered: a legal missing link.
    assert!(table.traits(book).is_empty());
}

#[test]
fn method_in_own_file_is_found_first() {
    let text = ENTITY.replace(
        "private $title;",
        "private $title;\n\n    public function onSave() {}",
    );
    let table = table(&[
        ("Book.php", text.as_str()),
        ("Base.php", BASE_WITH_HOOK),
        ("Stamp.php", TRAIT_WITH_HOOK),
    ]);
    let book = table.lookup("App\\Entity\\Book").unwrap();
    assert_eq!(table.find_declaring_artifact(book, "ONSAVE").unwrap(), Some(book));
}

#[test]
fn nested_traits_are_searched() {
    let outer = "<?php\nnamespace App\\Traits;\n\ntrait Stamp\n{\n    use Inner;\n}\n";
    let inner =
        "<?php\nnamespace App\\Traits;\n\ntrait Inner\n{\n    public function onSave() {}\n}\n";
    let table = table(&[
        ("Book.php", ENTITY),
        ("Stamp.php", outer),
        ("Inner.php", inner),
    ]);
    let book = table.lookup("App\\Entity\\Book").unwrap();
    let found = table.find_declaring_artifact(book, "onSave").unwrap();
    assert_eq!(found, table.lookup("App\\Traits\\Inner"));
}

#[test]
fn cyclic_supertypes_are_reported() {
    let a = "<?php\nnamespace App;\nclass A extends B\n{\n}\n";
    let b = "<?php\nnamespace App;\nclass B extends A\n{\n}\n";
    let table = table(&[("A.php", a), ("B.php", b)]);
    let root = table.lookup("App\\A").unwrap();
    let err = table.find_declaring_artifact(root, "missing").unwrap_err();
    assert!(matches!(err, HierarchyError::Cycle { .. }));
    assert!(err.to_string().contains("App\\A"));
}

#[test]
fn excluded_namespaces_are_not_registered() {
    let vendor = "<?php\nnamespace Vendor\\Lib;\nclass Base\n{\n    public function onSave() {}\n}\n";
    let child = "<?php\nnamespace App;\nuse Vendor\\Lib\\Base;\nclass Child extends Base\n{\n}\n";
    let artifacts = vec![class("Base.php", vendor), class("Child.php", child)];
    let table = ArtifactTable::build(artifacts, &["Vendor\\".to_string()]);

    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("Vendor\\Lib\\Base"), None);
    let root = table.lookup("App\\Child").unwrap();
    assert_eq!(table.find_declaring_artifact(root, "onSave").unwrap(), None);
}

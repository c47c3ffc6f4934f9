//! Integration tests for the complete ormdoc pipeline
//!
//! These tests run real project trees on disk across crates:
//! - discovery → artifact table → synchronizer → patched files
//! - re-runs over already patched trees
//! - per-file failure isolation
//!
//! Run with: cargo test --test integration_tests

use ormdoc_sync::{
    load_artifacts, load_mappings, scan_project, BatchSummary, FsStore, Level, SyncError,
    SyncOptions, Synchronizer,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const BOOK_PHP: &str = r#"<?php

namespace App\Entity;

use App\Model\Timestamped;
use App\Traits\Sluggable;

/**
 * Legacy description.
 */
class Book extends Timestamped
{
    use Sluggable;

    /**
     * @var int
     */
    private $id;

    private $title;
}
"#;

const TIMESTAMPED_PHP: &str = r#"<?php

namespace App\Model;

abstract class Timestamped
{
    /**
     * Sets both timestamps.
     */
    public function touch(): void
    {
    }
}
"#;

const SLUGGABLE_PHP: &str = r#"<?php

namespace App\Traits;

trait Sluggable
{
    public function refreshSlug(): void
    {
    }
}
"#;

const AUTHOR_PHP: &str = r#"<?php

namespace App\Entity;

class Author
{
}
"#;

const VENDOR_PHP: &str = r#"<?php

namespace Vendor\Orm;

class Author
{
}
"#;

const BOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<doctrine-mapping xmlns="http://doctrine-project.org/schemas/orm/doctrine-mapping">
    <entity name="App\Entity\Book" table="book" repository-class="App\Repository\BookRepository">
        <indexes>
            <index name="title_idx" columns="title"/>
        </indexes>
        <lifecycle-callbacks>
            <lifecycle-callback type="prePersist" method="refreshSlug"/>
            <lifecycle-callback type="preUpdate" method="touch"/>
        </lifecycle-callbacks>
        <id name="id" type="integer" column="id">
            <generator strategy="IDENTITY"/>
        </id>
        <field name="title" column="title" type="string" length="255" nullable="false"/>
        <field name="price" column="price" type="decimal" precision="10" scale="2">
            <options>
                <option name="unsigned">true</option>
            </options>
        </field>
        <many-to-one field="author" target-entity="App\Entity\Author" inversed-by="books">
            <cascade><cascade-persist/></cascade>
            <join-column name="author_id" referenced-column-name="id" on-delete="CASCADE"/>
        </many-to-one>
        <many-to-many field="tags" target-entity="App\Entity\Tag">
            <join-table name="book_tag">
                <join-columns>
                    <join-column name="book_id" referenced-column-name="id"/>
                </join-columns>
                <inverse-join-columns>
                    <join-column name="tag_id" referenced-column-name="id"/>
                </inverse-join-columns>
            </join-table>
        </many-to-many>
    </entity>
</doctrine-mapping>
"#;

const GHOST_XML: &str = r#"<doctrine-mapping>
    <entity name="App\Entity\Ghost" table="ghost" repository-class="App\Repository\GhostRepository"/>
</doctrine-mapping>
"#;

const AUTHOR_XML: &str = r#"<doctrine-mapping>
    <entity name="App\Entity\Author" table="author" repository-class="App\Repository\AuthorRepository">
        <one-to-many field="books" target-entity="App\Entity\Book" mapped-by="author"/>
    </entity>
</doctrine-mapping>
"#;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn project(root: &Path) {
    write(root, "src/Entity/Book.php", BOOK_PHP);
    write(root, "src/Entity/Author.php", AUTHOR_PHP);
    write(root, "src/Model/Timestamped.php", TIMESTAMPED_PHP);
    write(root, "src/Traits/Sluggable.php", SLUGGABLE_PHP);
    write(root, "vendor/orm/Author.php", VENDOR_PHP);
    write(root, "config/doctrine/1_Book.orm.xml", BOOK_XML);
    write(root, "config/doctrine/2_Ghost.orm.xml", GHOST_XML);
    write(root, "config/doctrine/3_Author.orm.xml", AUTHOR_XML);
}

fn sync(root: &Path, options: &SyncOptions) -> (BatchSummary, Vec<(Level, String)>) {
    let files = scan_project(root, options);
    let documents = load_mappings(&files, &FsStore);
    let table = load_artifacts(&files, &FsStore, options);
    let mut lines = Vec::new();
    let summary = Synchronizer::new(&table, &FsStore, options).run(&documents, &mut lines);
    (summary, lines)
}

fn snapshot(root: &Path) -> Vec<String> {
    [
        "src/Entity/Book.php",
        "src/Entity/Author.php",
        "src/Model/Timestamped.php",
        "src/Traits/Sluggable.php",
        "vendor/orm/Author.php",
    ]
    .iter()
    .map(|rel| read(root, rel))
    .collect()
}

#[test]
fn test_full_entity_is_annotated() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);

    sync(root, &SyncOptions::default());
    let book = read(root, "src/Entity/Book.php");

    let expected_class = concat!(
        "/**\n",
        " * @ORM\\Entity(repositoryClass=\"App\\Repository\\BookRepository\")\n",
        " * @ORM\\Table(name=\"book\", indexes={@ORM\\Index(name=\"title_idx\", columns={\"title\"})})\n",
        " * @ORM\\HasLifecycleCallbacks\n",
        " */\n",
        "class Book extends Timestamped\n",
    );
    assert!(book.contains(expected_class), "{book}");
    assert!(!book.contains("Legacy description."));

    assert!(book.contains(concat!(
        "    /**\n",
        "     * @ORM\\Id\n",
        "     * @ORM\\Column(column=\"id\", type=\"integer\")\n",
        "     * @ORM\\GeneratedValue(strategy=\"IDENTITY\")\n",
        "     */\n",
        "    private $id;\n",
    )));
    assert!(book.contains(concat!(
        "    /**\n",
        "     * @ORM\\Column(column=\"title\", type=\"string\", nullable=false, length=255)\n",
        "     */\n",
        "    private $title;\n",
    )));
    assert!(book.contains(
        "     * @ORM\\Column(column=\"price\", type=\"decimal\", precision=10, scale=2, options={\"unsigned\":true})\n     */\n    private $price;"
    ));
    assert!(book.contains(concat!(
        "     * @ORM\\ManyToOne(targetEntity=\"App\\Entity\\Author\", inversedBy=\"books\", cascade={\"persist\"})\n",
        "     * @ORM\\JoinColumn(name=\"author_id\", referencedColumnName=\"id\", nullable=true, onDelete=\"CASCADE\")\n",
        "     */\n",
        "    private $author;",
    )));
    assert!(book.contains(
        "     * @ORM\\JoinTable(name=\"book_tag\", joinColumns={@ORM\\JoinColumn(name=\"book_id\", referencedColumnName=\"id\", nullable=true)}, inverseJoinColumns={@ORM\\JoinColumn(name=\"tag_id\", referencedColumnName=\"id\", nullable=true)})"
    ));
    assert_eq!(book.matches("use Doctrine\\ORM\\Mapping as ORM;").count(), 1);
}

#[test]
fn test_callbacks_land_in_trait_and_ancestor() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);

    sync(root, &SyncOptions::default());

    let sluggable = read(root, "src/Traits/Sluggable.php");
    assert!(sluggable.contains(
        "    /**\n     * @ORM\\PrePersist\n     */\n    public function refreshSlug(): void"
    ));
    assert!(sluggable.contains("use Doctrine\\ORM\\Mapping as ORM;"));

    let timestamped = read(root, "src/Model/Timestamped.php");
    assert!(timestamped.contains(
        "    /**\n     * @ORM\\PreUpdate\n     * Sets both timestamps.\n     */\n    public function touch(): void"
    ));
}

#[test]
fn test_second_run_is_byte_identical() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);

    let options = SyncOptions::default();
    sync(root, &options);
    let first = snapshot(root);

    let (summary, _) = sync(root, &options);
    assert_eq!(summary.patched(), 0);
    assert_eq!(snapshot(root), first);
}

#[test]
fn test_batch_isolation() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);

    let (summary, lines) = sync(root, &SyncOptions::default());
    assert_eq!(summary.reports.len(), 3);
    assert!(summary.reports[0].outcome.is_ok());
    assert!(matches!(
        summary.reports[1].outcome,
        Err(SyncError::UnresolvedOwner { .. })
    ));
    assert!(summary.reports[2].outcome.is_ok());
    assert_eq!(summary.failed_entities(), vec!["App\\Entity\\Ghost"]);

    let author = read(root, "src/Entity/Author.php");
    assert!(author.contains(
        "     * @ORM\\OneToMany(targetEntity=\"App\\Entity\\Book\", mappedBy=\"author\")\n     */\n    private $books;"
    ));
    assert_eq!(
        lines.iter().filter(|(level, _)| *level == Level::Error).count(),
        1
    );
}

#[test]
fn test_excluded_namespace_is_never_touched() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);
    write(
        root,
        "config/doctrine/4_Vendor.orm.xml",
        r#"<entity name="Vendor\Orm\Author" table="v" repository-class="R"/>"#,
    );

    let options = SyncOptions {
        exclude_namespaces: vec!["Vendor\\".to_string()],
        ..SyncOptions::default()
    };
    let (summary, _) = sync(root, &options);

    assert_eq!(summary.failed_entities(), vec!["App\\Entity\\Ghost", "Vendor\\Orm\\Author"]);
    assert_eq!(read(root, "vendor/orm/Author.php"), VENDOR_PHP);
}

#[test]
fn test_crlf_sources_keep_their_line_endings() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    project(root);
    write(root, "src/Entity/Author.php", &AUTHOR_PHP.replace('\n', "\r\n"));

    sync(root, &SyncOptions::default());
    let author = read(root, "src/Entity/Author.php");
    assert!(author.contains("private $books;\r\n"));
    assert_eq!(author.matches('\n').count(), author.matches("\r\n").count());
}

use notedown_core::{
    Document, DocumentHost, LinkTarget, Notebook, RenamePlan, Settings, TextDocument, TitleSet,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn notebook() -> Notebook {
    Notebook::new(Settings::default())
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), "").unwrap();
}

fn settle() {
    std::thread::sleep(Duration::from_millis(50));
}

#[derive(Default)]
struct Host {
    closed: Vec<PathBuf>,
    reopened: Vec<PathBuf>,
}

impl DocumentHost for Host {
    fn close(&mut self, path: &Path) {
        self.closed.push(path.to_path_buf());
    }

    fn reopen(&mut self, path: &Path) {
        self.reopened.push(path.to_path_buf());
    }
}

// === Directory index ===

#[test]
fn unchanged_directory_returns_same_index() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Note one.md");
    let nb = notebook();

    let first = nb.index(dir.path()).unwrap();
    let second = nb.index(dir.path()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn adding_removing_and_renaming_rebuild_the_index() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Note one.md");
    let nb = notebook();
    let before = nb.index(dir.path()).unwrap();

    settle();
    touch(dir.path(), "Note two.md");
    let added = nb.index(dir.path()).unwrap();
    assert!(!Arc::ptr_eq(&before, &added));
    assert!(added.contains_title("note two"));

    settle();
    fs::rename(dir.path().join("Note two.md"), dir.path().join("Note three.md")).unwrap();
    let renamed = nb.index(dir.path()).unwrap();
    assert!(!Arc::ptr_eq(&added, &renamed));
    assert!(!renamed.contains_title("note two"));
    assert!(renamed.contains_title("note three"));

    settle();
    fs::remove_file(dir.path().join("Note one.md")).unwrap();
    let removed = nb.index(dir.path()).unwrap();
    assert!(!Arc::ptr_eq(&renamed, &removed));
    assert!(!removed.contains_title("note one"));
}

#[test]
fn titles_and_aliases_across_three_notes() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Note one.md");
    touch(dir.path(), "Note two~Alt one.md");
    touch(dir.path(), "Note three~Alt two~ALT one.md");

    let index = notebook().index(dir.path()).unwrap();
    let mut keys: Vec<&str> = index.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["alt one", "alt two", "note one", "note three", "note two"]);

    // Entries for a shared title follow directory listing order.
    let listed: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("Note two") || name.starts_with("Note three"))
        .collect();
    let expected: Vec<(&str, &str)> = listed
        .iter()
        .map(|name| {
            if name.starts_with("Note two") {
                ("Alt one", name.as_str())
            } else {
                ("ALT one", name.as_str())
            }
        })
        .collect();
    let entries: Vec<(&str, &str)> = index
        .get("alt one")
        .unwrap()
        .iter()
        .map(|e| (e.title.as_str(), e.filename.as_str()))
        .collect();
    assert_eq!(entries, expected);
}

// === Titles ===

#[test]
fn filename_round_trip() {
    let nb = notebook();
    let sets = [
        vec!["Only"],
        vec!["Note three", "Alt two", "ALT one"],
        vec!["C++ (draft)", "with.dots", "ünïcode"],
    ];
    for titles in sets {
        let set = TitleSet::new(titles.iter().map(|t| t.to_string()).collect());
        for ext in ["md", "MD", "markdown"] {
            let filename = set.to_filename('~', ext);
            assert_eq!(nb.parser().parse(&filename), set, "{}", filename);
        }
    }
}

// === Resolution ===

#[test]
fn resolution_ignores_case() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Note One.md");
    let nb = notebook();
    for query in ["Note One", "note one", "NOTE ONE"] {
        assert_eq!(nb.resolve(dir.path(), query).unwrap(), vec!["Note One.md"]);
    }
}

#[test]
fn case_collisions_return_every_file() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "Topic.md");
    touch(dir.path(), "Other~topic.md");
    let path = dir.path().join("Here.md");
    let doc = TextDocument::new(1, "# Here\n[[TOPIC]]");

    let target = notebook().open_link(&doc, &path, 10, None).unwrap().unwrap();
    let LinkTarget::Choose { title, mut filenames } = target else {
        panic!("expected a choice, got {:?}", target);
    };
    filenames.sort();
    assert_eq!(title, "TOPIC");
    assert_eq!(filenames, vec!["Other~topic.md", "Topic.md"]);
}

// === Links ===

#[test]
fn links_in_code_are_not_links() {
    let text = "[[X]] and `[[X]]`\n\n```\n[[X]]\n```\n";
    let doc = TextDocument::new(7, text);
    let links = notebook().links(&doc);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].start, 0);
    assert_eq!(links[0].title(doc.text()), "X");
}

// === Notes ===

#[test]
fn new_note_links_back() {
    let dir = tempfile::tempdir().unwrap();
    let from = dir.path().join("Note one.md");
    fs::write(&from, "# Note one\n\nSee [[Foo]]\n").unwrap();

    let created = notebook().create_note(&from, "Foo").unwrap();
    assert_eq!(created, dir.path().join("Foo.md"));
    assert_eq!(
        fs::read_to_string(created).unwrap(),
        "# Foo\n\nSee also:\n\n- [[Note one]]\n"
    );
}

// === Renames ===

#[test]
fn rename_rewrites_only_matching_links() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("A~B.md"), "# A\n").unwrap();
    fs::write(dir.path().join("Other.md"), "See [[A]] and [[b]]").unwrap();
    fs::write(dir.path().join("Third.md"), "See [[Other]]").unwrap();
    let nb = notebook();

    let plan = RenamePlan::new(dir.path(), "A~B.md", "C.md");
    let report = nb.apply_rename(&plan, &mut Host::default()).unwrap();
    assert_eq!(report.backlinks.files_modified(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("Other.md")).unwrap(),
        "See [[C]] and [[C]]"
    );
    assert_eq!(fs::read_to_string(dir.path().join("Third.md")).unwrap(), "See [[Other]]");

    // Nothing left to replace the second time round.
    let again = nb.rewrite_backlinks(dir.path(), "C.md", "C.md").unwrap();
    assert_eq!(again.files_modified(), 0);
}

#[test]
fn adding_an_alias_keeps_links() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.md"), "# a\n").unwrap();
    fs::write(dir.path().join("Other.md"), "[[a]]").unwrap();
    let mut host = Host::default();

    let plan = RenamePlan::new(dir.path(), "a.md", "a~x.md");
    let report = notebook().apply_rename(&plan, &mut host).unwrap();
    assert_eq!(report.backlinks.substitutions(), 0);
    assert_eq!(fs::read_to_string(dir.path().join("Other.md")).unwrap(), "[[a]]");
    assert_eq!(host.closed, vec![dir.path().join("a.md")]);
    assert_eq!(host.reopened, vec![dir.path().join("a~x.md")]);
}

#[test]
fn retitle_from_heading_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Draft~Ideas.md");
    fs::write(&path, "# Plans\n").unwrap();
    fs::write(dir.path().join("Index.md"), "- [[draft]]\n- [[Ideas]]\n").unwrap();
    let nb = notebook();
    let doc = TextDocument::new(1, fs::read_to_string(&path).unwrap());

    let plan = nb.plan_heading_rename(&doc, &path).unwrap().unwrap();
    assert_eq!(plan.new_filename, "Plans~Ideas.md");
    nb.apply_rename(&plan, &mut Host::default()).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("Index.md")).unwrap(),
        "- [[Plans]]\n- [[Ideas]]\n"
    );
    assert_eq!(nb.resolve(dir.path(), "plans").unwrap(), vec!["Plans~Ideas.md"]);
}

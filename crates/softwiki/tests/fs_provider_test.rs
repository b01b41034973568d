use softwiki::{
    CategoryUpdate, DataProvider, FileSystemProvider, NewCategory, NewNote, NewTag, NoteUpdate,
    TagUpdate, WikiError,
};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FileSystemProvider) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let provider = FileSystemProvider::new(dir.path().to_path_buf());
    (dir, provider)
}

#[test]
fn test_note_round_trip() {
    let (_dir, mut wiki) = setup();
    let work = wiki.create_category(NewCategory::new("Work")).unwrap();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    let later = wiki.create_tag(NewTag::new("later", "#0f0")).unwrap();

    let created = wiki
        .create_note(
            NewNote::new("Plan", "Line one\nLine two\n")
                .with_tags([urgent.id.clone(), later.id.clone()])
                .in_category(work.id.clone()),
        )
        .unwrap();

    let notes = wiki.list_notes().unwrap();
    assert_eq!(notes, vec![created.clone()]);
    assert_eq!(created.title, "Plan");
    assert_eq!(created.body, "Line one\nLine two\n");
    assert_eq!(created.tag_ids, vec![urgent.id, later.id]);
    assert_eq!(created.category_id, Some(work.id));
}

#[test]
fn test_uncategorized_notes_have_no_category() {
    let (dir, mut wiki) = setup();
    let note = wiki.create_note(NewNote::new("Groceries", "milk")).unwrap();

    assert_eq!(note.category_id, None);
    assert!(dir.path().join("Groceries").is_file());
    assert!(wiki.list_categories().unwrap().is_empty());
}

#[test]
fn test_forbidden_titles() {
    let (_dir, mut wiki) = setup();

    let err = wiki.create_note(NewNote::new(".hidden", "")).unwrap_err();
    assert!(matches!(err, WikiError::ForbiddenSequence { sequence: ".", .. }));
    assert!(err.to_string().contains("\".\""));

    let err = wiki.create_note(NewNote::new("a/b", "")).unwrap_err();
    assert!(matches!(err, WikiError::ForbiddenSequence { sequence: "/", .. }));

    assert!(wiki.list_notes().unwrap().is_empty());
}

#[test]
fn test_category_rename_keeps_note_ids() {
    let (dir, mut wiki) = setup();
    let work = wiki.create_category(NewCategory::new("Work")).unwrap();
    let note = wiki
        .create_note(NewNote::new("Plan", "x").in_category(work.id.clone()))
        .unwrap();
    assert_eq!(
        wiki.path_of(&note.id).unwrap(),
        dir.path().join("Work").join("Plan")
    );

    wiki.update_category(
        &work.id,
        CategoryUpdate {
            name: Some("Job".to_string()),
        },
    )
    .unwrap();

    assert_eq!(
        wiki.path_of(&note.id).unwrap(),
        dir.path().join("Job").join("Plan")
    );
    let notes = wiki.list_notes().unwrap();
    assert_eq!(notes[0].id, note.id);
    assert_eq!(notes[0].category_id, Some(work.id.clone()));
    let categories = wiki.list_categories().unwrap();
    assert_eq!(categories[0].name, "Job");
    assert_eq!(categories[0].note_ids, vec![note.id]);
    assert!(!dir.path().join("Work").exists());
}

#[test]
fn test_add_tag_twice_is_idempotent() {
    let (_dir, mut wiki) = setup();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    let note = wiki.create_note(NewNote::new("Plan", "")).unwrap();

    wiki.add_tag_to_note(&note.id, &urgent.id).unwrap();
    let once = wiki.list_notes().unwrap()[0].tag_ids.len();
    wiki.add_tag_to_note(&note.id, &urgent.id).unwrap();
    let twice = wiki.list_notes().unwrap()[0].tag_ids.len();

    assert_eq!(once, 1);
    assert_eq!(twice, 1);
}

#[test]
fn test_remove_tag_from_note() {
    let (_dir, mut wiki) = setup();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    let note = wiki
        .create_note(NewNote::new("Plan", "").with_tags([urgent.id.clone()]))
        .unwrap();

    wiki.remove_tag_from_note(&note.id, &urgent.id).unwrap();
    wiki.remove_tag_from_note(&note.id, &urgent.id).unwrap();

    assert!(wiki.list_notes().unwrap()[0].tag_ids.is_empty());
}

#[test]
fn test_deleting_tag_removes_it_from_every_note() {
    let (dir, mut wiki) = setup();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    let keep = wiki.create_tag(NewTag::new("keep", "#00f")).unwrap();
    for title in ["A", "B"] {
        wiki.create_note(
            NewNote::new(title, "").with_tags([urgent.id.clone(), keep.id.clone()]),
        )
        .unwrap();
    }

    wiki.delete_tag(&urgent.id).unwrap();

    for note in wiki.list_notes().unwrap() {
        assert_eq!(note.tag_ids, vec![keep.id.clone()]);
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("A")).unwrap(),
        "---\ntags: keep\n---\n"
    );
    assert_eq!(wiki.list_tags().unwrap(), vec![keep]);
}

#[test]
fn test_deleted_tag_name_reused_does_not_resurrect_links() {
    let (_dir, mut wiki) = setup();
    let old = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    wiki.create_note(NewNote::new("A", "").with_tags([old.id.clone()]))
        .unwrap();

    wiki.delete_tag(&old.id).unwrap();
    wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();

    assert!(wiki.list_notes().unwrap()[0].tag_ids.is_empty());
}

#[test]
fn test_tag_rename_keeps_notes_resolving() {
    let (_dir, mut wiki) = setup();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    wiki.create_note(NewNote::new("A", "").with_tags([urgent.id.clone()]))
        .unwrap();

    wiki.update_tag(
        &urgent.id,
        TagUpdate {
            name: Some("asap".to_string()),
            color: Some("#ff8800".to_string()),
        },
    )
    .unwrap();

    let notes = wiki.list_notes().unwrap();
    assert_eq!(notes[0].tag_ids, vec![urgent.id.clone()]);
    let tags = wiki.list_tags().unwrap();
    assert_eq!(tags[0].name, "asap");
    assert_eq!(tags[0].color, "#ff8800");
}

#[test]
fn test_unknown_ids() {
    let (_dir, mut wiki) = setup();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();

    assert!(wiki
        .update_note("404", NoteUpdate::default())
        .unwrap_err()
        .is_unknown_id());
    assert!(wiki.delete_note("404").unwrap_err().is_unknown_id());
    assert!(wiki
        .add_tag_to_note("404", &urgent.id)
        .unwrap_err()
        .is_unknown_id());
    assert!(wiki
        .update_tag("404", TagUpdate::default())
        .unwrap_err()
        .is_unknown_id());
    assert!(wiki.delete_tag("404").unwrap_err().is_unknown_id());
    assert!(wiki
        .update_category("404", CategoryUpdate::default())
        .unwrap_err()
        .is_unknown_id());
    assert!(wiki.delete_category("404").unwrap_err().is_unknown_id());
}

#[test]
fn test_malformed_note_is_skipped() {
    let (dir, mut wiki) = setup();
    fs::write(dir.path().join("Broken"), "---\ntags: a\nnever closed\n").unwrap();
    fs::write(dir.path().join("Fine"), "---\ntags: \n---\nok").unwrap();

    let notes = wiki.list_notes().unwrap();

    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Fine");
    assert_eq!(notes[0].body, "ok");
}

#[test]
fn test_reopen_rediscovers_everything() {
    let (dir, mut wiki) = setup();
    let work = wiki.create_category(NewCategory::new("Work")).unwrap();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    wiki.create_note(
        NewNote::new("Plan", "body")
            .with_tags([urgent.id.clone()])
            .in_category(work.id),
    )
    .unwrap();
    wiki.create_note(NewNote::new("Loose", "free")).unwrap();
    drop(wiki);

    let mut reopened = FileSystemProvider::new(dir.path().to_path_buf());
    let categories = reopened.list_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Work");

    let mut notes = reopened.list_notes().unwrap();
    notes.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(notes[0].title, "Loose");
    assert_eq!(notes[0].category_id, None);
    assert_eq!(notes[1].title, "Plan");
    assert_eq!(notes[1].body, "body");
    assert_eq!(notes[1].tag_ids, vec![urgent.id]);
    assert_eq!(notes[1].category_id, Some(categories[0].id.clone()));
}

#[test]
fn test_open_reads_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".softwiki.toml"),
        "tags_file = \".index.json\"\nfile_ext = \"md\"\n",
    )
    .unwrap();

    let mut wiki = softwiki::open(dir.path()).unwrap();
    wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    wiki.create_note(NewNote::new("Plan", "x")).unwrap();

    assert!(dir.path().join(".index.json").is_file());
    assert!(dir.path().join("Plan.md").is_file());
    assert_eq!(wiki.list_notes().unwrap()[0].title, "Plan");
}

/// Work/Personal: move a tagged note between categories.
#[test]
fn test_move_note_between_categories() {
    let (dir, mut wiki) = setup();
    let work = wiki.create_category(NewCategory::new("Work")).unwrap();
    let personal = wiki.create_category(NewCategory::new("Personal")).unwrap();
    let urgent = wiki.create_tag(NewTag::new("urgent", "#f00")).unwrap();
    let plan = wiki
        .create_note(
            NewNote::new("Plan", "steps")
                .with_tags([urgent.id.clone()])
                .in_category(work.id.clone()),
        )
        .unwrap();

    wiki.update_note(
        &plan.id,
        NoteUpdate {
            category_id: Some(Some(personal.id.clone())),
            ..Default::default()
        },
    )
    .unwrap();

    let notes = wiki.list_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, plan.id);
    assert_eq!(notes[0].category_id, Some(personal.id.clone()));
    assert_eq!(notes[0].tag_ids, vec![urgent.id]);

    assert!(!dir.path().join("Work").join("Plan").exists());
    assert!(dir.path().join("Personal").join("Plan").is_file());

    let categories = wiki.list_categories().unwrap();
    let personal_listed = categories.iter().find(|c| c.id == personal.id).unwrap();
    assert_eq!(personal_listed.name, "Personal");
    assert_eq!(personal_listed.note_ids, vec![plan.id.clone()]);
    let work_listed = categories.iter().find(|c| c.id == work.id).unwrap();
    assert!(work_listed.note_ids.is_empty());
}

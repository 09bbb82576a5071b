use ritsu::engine::{self, Project};
use ritsu::frontmatter;
use ritsu::layout::Layout;
use ritsu::store::{self, PostEntry};
use ritsu::theme::ThemeFetcher;
use ritsu::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Installs a minimal theme instead of cloning one.
struct StubTheme;

impl ThemeFetcher for StubTheme {
    fn fetch(&self, dest: &Path) -> Result<()> {
        let templates = dest.join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(
            templates.join("layout.html"),
            r#"<html><title>{{.site.siteName}}</title>{{template "content" .}}</html>"#,
        )
        .unwrap();
        fs::write(
            templates.join("post.html"),
            r#"{{define "content"}}<h1>{{.post.title}}</h1>{{.post.body}}{{end}}"#,
        )
        .unwrap();
        fs::create_dir_all(dest.join("resources")).unwrap();
        fs::write(dest.join("resources/style.css"), "body{}").unwrap();
        Ok(())
    }
}

struct NoGit;

impl ThemeFetcher for NoGit {
    fn fetch(&self, _dest: &Path) -> Result<()> {
        Err(Error::MissingTool("git".to_owned()))
    }
}

struct UnreachableRepo;

impl ThemeFetcher for UnreachableRepo {
    fn fetch(&self, _dest: &Path) -> Result<()> {
        Err(Error::ThemeFetch("repository not found".to_owned()))
    }
}

/// A temp directory with an initialized blog in `blog/`.
struct Blog {
    _dir: TempDir,
    root: PathBuf,
}

impl Blog {
    fn new() -> Blog {
        let dir = TempDir::new().unwrap();
        let root = engine::init(dir.path(), None, &StubTheme).unwrap();
        Blog { _dir: dir, root }
    }

    fn layout(&self) -> Layout {
        Layout::new(&self.root)
    }

    fn post_data(&self) -> Vec<PostEntry> {
        store::load(&self.root).unwrap().post_data
    }

    fn names(&self) -> Vec<String> {
        self.post_data().into_iter().map(|p| p.file_name).collect()
    }

    fn draft(&self, name: &str, contents: &str) {
        fs::write(self.layout().draft(name), contents).unwrap();
    }
}

fn html_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap().into_path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "html"))
        .collect()
}

#[test]
fn init_creates_project() {
    let dir = TempDir::new().unwrap();
    let root = engine::init(dir.path(), Some("myblog"), &StubTheme).unwrap();
    assert_eq!(root, dir.path().join("myblog"));

    let layout = Layout::new(&root);
    for d in layout.content_dirs() {
        assert!(d.is_dir(), "{} missing", d.display());
    }
    assert!(layout.site_config_file().is_file());
    assert!(layout.theme_config_file().is_file());
    assert!(layout.template("default").is_file());
    assert!(layout.draft("ritsu").is_file());
    assert!(layout.theme("notes").join("templates/layout.html").is_file());

    let record = store::load(&root).unwrap();
    assert_eq!(record.root_path, root);
    assert!(record.post_data.is_empty());
    assert_eq!(record.default_site_config["theme"], "notes");
    assert_eq!(record.default_theme_config["postsPerPage"], 10);
}

#[test]
fn init_existing_directory_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("blog");
    fs::create_dir(&existing).unwrap();
    fs::write(existing.join("keep.txt"), "mine").unwrap();

    let err = engine::init(dir.path(), None, &StubTheme).unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(fs::read_to_string(existing.join("keep.txt")).unwrap(), "mine");
}

#[test]
fn init_rolls_back_on_failure() {
    let dir = TempDir::new().unwrap();
    let err = engine::init(dir.path(), None, &NoGit).unwrap_err();
    assert!(matches!(err, Error::MissingTool(_)));
    assert!(!dir.path().join("blog").exists());
}

#[test]
fn init_survives_failed_theme_clone() {
    let dir = TempDir::new().unwrap();
    let root = engine::init(dir.path(), None, &UnreachableRepo).unwrap();
    let layout = Layout::new(&root);
    assert!(layout.draft("ritsu").is_file());
    assert!(layout.themes().is_dir());
    assert!(!layout.theme("notes").exists());
    assert!(store::load(&root).unwrap().post_data.is_empty());
}

#[test]
fn init_rejects_nested_directory_names() {
    let dir = TempDir::new().unwrap();
    for bad in ["a/b", "..", ""] {
        assert!(
            matches!(
                engine::init(dir.path(), Some(bad), &StubTheme),
                Err(Error::InvalidName(_))
            ),
            "{:?}",
            bad
        );
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn commands_outside_a_blog_fail() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        engine::new_post(dir.path(), "x", None),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        engine::publish(dir.path(), "x", None),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        engine::delete(dir.path(), "x"),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        engine::generate(dir.path(), None),
        Err(Error::NotInitialized)
    ));
}

#[test]
fn commands_work_from_subdirectories() {
    let blog = Blog::new();
    let nested = blog.layout().theme("notes").join("templates");
    let project = Project::open(&nested).unwrap();
    assert_eq!(project.layout.root(), blog.root.as_path());

    engine::new_post(&blog.layout().drafts(), "from-drafts", None).unwrap();
    assert!(blog.layout().draft("from-drafts").is_file());
}

#[test]
fn new_post_rejects_duplicates() {
    let blog = Blog::new();
    let draft = engine::new_post(&blog.root, "hello", None).unwrap();
    fs::write(&draft, "---\ntitle: Hello\n---\nmy words\n").unwrap();

    let err = engine::new_post(&blog.root, "hello", None).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(ref n) if n == "hello"));
    assert_eq!(
        fs::read_to_string(&draft).unwrap(),
        "---\ntitle: Hello\n---\nmy words\n"
    );
}

#[test]
fn new_post_rejects_published_and_trashed_names() {
    let blog = Blog::new();
    engine::publish(&blog.root, "ritsu", None).unwrap();
    assert!(matches!(
        engine::new_post(&blog.root, "ritsu", None),
        Err(Error::DuplicateName(_))
    ));

    engine::delete(&blog.root, "ritsu").unwrap();
    assert!(matches!(
        engine::new_post(&blog.root, "ritsu", None),
        Err(Error::DuplicateName(_))
    ));
}

#[test]
fn new_post_from_template() {
    let blog = Blog::new();
    fs::write(blog.layout().template("review"), "---\ntitle: Review\n---\n").unwrap();

    let draft = engine::new_post(&blog.root, "book", Some("review")).unwrap();
    assert_eq!(fs::read_to_string(draft).unwrap(), "---\ntitle: Review\n---\n");

    assert!(matches!(
        engine::new_post(&blog.root, "other", Some("missing")),
        Err(Error::TemplateNotFound(ref t)) if t == "missing"
    ));
    assert!(!blog.layout().draft("other").exists());
}

#[test]
fn new_post_restores_default_template() {
    let blog = Blog::new();
    let default = blog.layout().template("default");
    fs::remove_file(&default).unwrap();

    let draft = engine::new_post(&blog.root, "fresh", None).unwrap();
    assert!(default.is_file());
    assert_eq!(
        fs::read_to_string(draft).unwrap(),
        fs::read_to_string(default).unwrap()
    );
}

#[test]
fn publish_moves_draft_and_records_it() {
    let blog = Blog::new();
    blog.draft("ritsu", "---\ntitle: First Post\n---\nHello\n");

    let entry = engine::publish(&blog.root, "ritsu", Some("2021-04-16")).unwrap();
    assert_eq!(entry.file_name, "ritsu");
    assert_eq!(entry.title, "First Post");
    assert_eq!(entry.date, 1_618_531_200_000);

    assert!(!blog.layout().draft("ritsu").exists());
    assert!(blog.layout().post("ritsu").is_file());
    assert_eq!(blog.post_data(), vec![entry]);

    assert!(matches!(
        engine::publish(&blog.root, "ritsu", None),
        Err(Error::NotFound(_))
    ));
    assert_eq!(blog.names(), vec!["ritsu"]);
}

#[test]
fn publish_keeps_order() {
    let blog = Blog::new();
    for name in ["b", "a", "c"] {
        engine::new_post(&blog.root, name, None).unwrap();
        engine::publish(&blog.root, name, None).unwrap();
    }
    assert_eq!(blog.names(), vec!["b", "a", "c"]);
}

#[test]
fn publish_without_front_matter_uses_name() {
    let blog = Blog::new();
    blog.draft("plain", "just text\n");
    let entry = engine::publish(&blog.root, "plain", None).unwrap();
    assert_eq!(entry.title, "plain");
}

#[test]
fn publish_malformed_draft_stays_put() {
    let blog = Blog::new();
    blog.draft("broken", "---\ntitle: Broken\n");

    let err = engine::publish(&blog.root, "broken", None).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedFrontMatter {
            err: frontmatter::Error::MissingEndFence,
            ..
        }
    ));
    assert!(blog.layout().draft("broken").is_file());
    assert!(!blog.layout().post("broken").exists());
    assert!(blog.post_data().is_empty());
}

#[test]
fn publish_rejects_trashed_name() {
    let blog = Blog::new();
    engine::publish(&blog.root, "ritsu", None).unwrap();
    engine::delete(&blog.root, "ritsu").unwrap();
    blog.draft("ritsu", "---\ntitle: Again\n---\n");

    assert!(matches!(
        engine::publish(&blog.root, "ritsu", None),
        Err(Error::DuplicateName(ref n)) if n == "ritsu"
    ));
    assert!(blog.layout().draft("ritsu").is_file());
    assert!(!blog.layout().post("ritsu").exists());
    assert!(blog.post_data().is_empty());
}

#[test]
fn publish_rejects_bad_date() {
    let blog = Blog::new();
    assert!(matches!(
        engine::publish(&blog.root, "ritsu", Some("someday")),
        Err(Error::InvalidDate(_))
    ));
    assert!(blog.layout().draft("ritsu").is_file());
}

#[test]
fn delete_moves_post_to_trash() {
    let blog = Blog::new();
    engine::publish(&blog.root, "ritsu", None).unwrap();
    let contents = fs::read_to_string(blog.layout().post("ritsu")).unwrap();

    engine::delete(&blog.root, "ritsu").unwrap();
    assert!(!blog.layout().post("ritsu").exists());
    assert_eq!(
        fs::read_to_string(blog.layout().trashed("ritsu")).unwrap(),
        contents
    );
    assert!(blog.post_data().is_empty());

    assert!(matches!(
        engine::delete(&blog.root, "ritsu"),
        Err(Error::NotFound(_))
    ));
    assert_eq!(
        fs::read_to_string(blog.layout().trashed("ritsu")).unwrap(),
        contents
    );
    assert_eq!(fs::read_dir(blog.layout().trash()).unwrap().count(), 1);
}

#[test]
fn delete_refuses_trash_collision() {
    let blog = Blog::new();
    engine::publish(&blog.root, "ritsu", None).unwrap();
    fs::write(blog.layout().trashed("ritsu"), "older").unwrap();

    assert!(matches!(
        engine::delete(&blog.root, "ritsu"),
        Err(Error::TrashCollision(_))
    ));
    assert!(blog.layout().post("ritsu").is_file());
    assert_eq!(fs::read_to_string(blog.layout().trashed("ritsu")).unwrap(), "older");
    assert_eq!(blog.names(), vec!["ritsu"]);
}

#[test]
fn delete_without_store_entry_does_not_move() {
    let blog = Blog::new();
    fs::write(blog.layout().post("stray"), "---\ntitle: Stray\n---\n").unwrap();

    assert!(matches!(
        engine::delete(&blog.root, "stray"),
        Err(Error::NotFound(_))
    ));
    assert!(blog.layout().post("stray").is_file());
    assert!(!blog.layout().trashed("stray").exists());
}

#[test]
fn generate_round_trip() {
    let blog = Blog::new();
    let output = blog.root.join("public");
    assert!(!output.exists());

    engine::publish(&blog.root, "ritsu", None).unwrap();
    assert_eq!(engine::generate(&blog.root, None).unwrap(), output);

    let pages = html_files(&output);
    assert_eq!(pages, vec![output.join("post/ritsu.html")]);
    let page = fs::read_to_string(&pages[0]).unwrap();
    assert!(page.contains("<title>My Ritsu Blog</title>"));
    assert!(page.contains("<h1>Untitled</h1>"));
    assert_eq!(
        fs::read_to_string(output.join("resources/style.css")).unwrap(),
        "body{}"
    );
}

#[test]
fn generate_renders_in_publish_order() {
    let blog = Blog::new();
    for name in ["second", "first"] {
        blog.draft(name, &format!("---\ntitle: {}\n---\n", name));
        engine::publish(&blog.root, name, None).unwrap();
    }
    let output = engine::generate(&blog.root, Some("site")).unwrap();
    assert_eq!(output, blog.root.join("site"));
    assert!(output.join("post/second.html").is_file());
    assert!(output.join("post/first.html").is_file());
}

#[test]
fn generate_rolls_back_on_malformed_post() {
    let blog = Blog::new();
    engine::publish(&blog.root, "ritsu", None).unwrap();
    blog.draft("bad", "---\ntitle: Bad\n---\n");
    engine::publish(&blog.root, "bad", None).unwrap();
    fs::write(blog.layout().post("bad"), "---\ntitle: Bad\nno end\n").unwrap();
    let before = blog.post_data();

    let err = engine::generate(&blog.root, None).unwrap_err();
    assert!(matches!(err, Error::MalformedFrontMatter { .. }), "{}", err);
    assert!(!blog.root.join("public").exists());
    assert_eq!(blog.post_data(), before);
}

#[test]
fn generate_leaves_existing_output_alone() {
    let blog = Blog::new();
    let output = blog.root.join("public");
    fs::create_dir(&output).unwrap();
    fs::write(output.join("old.html"), "old").unwrap();

    let err = engine::generate(&blog.root, None).unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(fs::read_to_string(output.join("old.html")).unwrap(), "old");
}

#[test]
fn generate_stays_inside_the_blog() {
    let blog = Blog::new();
    for bad in ["../escaped", "a/b", ".."] {
        assert!(
            matches!(
                engine::generate(&blog.root, Some(bad)),
                Err(Error::InvalidName(_))
            ),
            "{:?}",
            bad
        );
    }
    assert!(!blog.root.parent().unwrap().join("escaped").exists());
    assert!(!blog.root.join("a").exists());
}

#[test]
fn generate_rolls_back_on_page_collision() {
    let blog = Blog::new();
    let index = blog.layout().theme("notes").join("templates/index.html");
    fs::write(&index, r#"{{define "content"}}INDEX{{end}}"#).unwrap();
    let site = blog.layout().site_config_file();
    let config = fs::read_to_string(&site).unwrap().replace("pageDir: page", "pageDir: post");
    fs::write(&site, config).unwrap();
    fs::write(blog.layout().theme_config_file(), "postsPerPage: 1\n").unwrap();

    for name in ["a", "1"] {
        engine::new_post(&blog.root, name, None).unwrap();
        engine::publish(&blog.root, name, None).unwrap();
    }
    let err = engine::generate(&blog.root, None).unwrap_err();
    assert!(
        matches!(err, Error::Render(ritsu::render::Error::DuplicateOutput(ref url)) if url == "post/1.html"),
        "{}",
        err
    );
    assert!(!blog.root.join("public").exists());
}

#[test]
fn generate_fails_without_site_config() {
    let blog = Blog::new();
    fs::remove_file(blog.layout().site_config_file()).unwrap();
    assert!(matches!(
        engine::generate(&blog.root, None),
        Err(Error::Config { .. })
    ));
    assert!(!blog.root.join("public").exists());
}

//! folio - build EPUB files from a JSON book manifest

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use folio::{Book, Error, NavPoint, Version};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Build EPUB 2/3 ebooks from a manifest", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio build book.json book.epub                  Write an EPUB 2 book
    folio build book.json book.epub --epub-version 3 Write an EPUB 3 book
    folio inspect book.json                          Show what would be written")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build an EPUB from a manifest
    Build {
        /// Book manifest (JSON)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output EPUB file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// EPUB version to write (2 or 3); overrides the manifest
        #[arg(long, value_name = "N")]
        epub_version: Option<u8>,

        /// Keep EPUB 2 doctypes in content documents when writing EPUB 3
        #[arg(long)]
        no_fix_markup: bool,
    },
    /// Print the metadata, spine and table of contents of a manifest
    Inspect {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Build {
            manifest,
            output,
            epub_version,
            no_fix_markup,
        } => build(&manifest, &output, epub_version, no_fix_markup),
        Command::Inspect { manifest } => inspect(&manifest),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build(
    manifest: &Path,
    output: &Path,
    epub_version: Option<u8>,
    no_fix_markup: bool,
) -> Result<(), String> {
    let mut book = load_book(manifest)?;
    if let Some(version) = epub_version {
        book.set_version(Version::try_from(version).map_err(|e| e.to_string())?);
    }
    if no_fix_markup {
        book.set_fix_legacy_markup(false);
    }
    book.write(output).map_err(|e| e.to_string())?;
    tracing::info!(output = %output.display(), version = %book.version(), "done");
    Ok(())
}

fn inspect(manifest: &Path) -> Result<(), String> {
    let book = load_book(manifest)?;

    println!("Manifest: {}", manifest.display());
    println!("Title: {}", book.title());
    println!("Identifier: {}", book.identifier());
    println!("EPUB version: {}", book.version());
    if !book.authors().is_empty() {
        println!("Authors: {}", book.authors().join(", "));
    }
    if let Some(collection) = book.collection() {
        let entry = book.entry_number().map(|e| format!(" #{e}")).unwrap_or_default();
        println!(
            "{}: {}{entry}",
            collection.collection_type.as_str(),
            collection.name
        );
    }
    println!(
        "Resources: {} images, {} stylesheets, {} scripts, {} fonts",
        book.images().len(),
        book.stylesheets().len(),
        book.scripts().len(),
        book.fonts().len()
    );

    println!("Spine:");
    for doc in book.spine() {
        println!("  {} {} (order {})", doc.id, doc.path, doc.order);
    }

    println!("Table of contents:");
    fn print_toc(points: &[NavPoint], depth: usize) {
        for point in folio::model::nav::sorted(points) {
            println!("{}{} -> {}", "  ".repeat(depth + 1), point.label, point.target);
            print_toc(&point.children, depth + 1);
        }
    }
    print_toc(book.navpoints(), 0);

    for target in book.dangling_navpoints() {
        println!("warning: no content document for TOC target {target}");
    }

    Ok(())
}

// ============================================================================
// Manifest
// ============================================================================

/// JSON description of a book. Resource sources are relative to the
/// manifest file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Manifest {
    version: Option<u8>,
    uuid: Option<String>,
    title: Option<String>,
    authors: Vec<String>,
    artists: Vec<String>,
    creators: Vec<Agent>,
    contributors: Vec<Agent>,
    languages: Vec<String>,
    publisher: Option<String>,
    description: Option<String>,
    subjects: Vec<String>,
    rights: Option<String>,
    date: Option<String>,
    identifiers: Vec<String>,
    series: Option<String>,
    set: Option<String>,
    entry: Option<String>,
    /// Book path of the image to use as the cover.
    cover: Option<String>,
    images: Vec<FileEntry>,
    stylesheets: Vec<FileEntry>,
    scripts: Vec<FileEntry>,
    fonts: Vec<FileEntry>,
    documents: Vec<DocumentEntry>,
    toc: Vec<TocEntry>,
    fix_legacy_markup: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Agent {
    name: String,
    role: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileEntry {
    source: PathBuf,
    dest: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentEntry {
    source: PathBuf,
    dest: String,
    #[serde(default)]
    order: Option<OrderSpec>,
}

/// A spine order given either as a number or as a list holding at most
/// one number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderSpec {
    One(i32),
    Many(Vec<i32>),
}

impl OrderSpec {
    fn resolve(&self, dest: &str) -> folio::Result<Option<i32>> {
        match self {
            Self::One(order) => Ok(Some(*order)),
            Self::Many(orders) => match orders.as_slice() {
                [] => Ok(None),
                [order] => Ok(Some(*order)),
                _ => Err(Error::TooManyArguments(format!(
                    "{} order values given for {dest}",
                    orders.len()
                ))),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TocEntry {
    label: String,
    target: String,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    children: Vec<TocEntry>,
}

fn load_book(path: &Path) -> Result<Book, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .map_err(|e| format!("invalid manifest {}: {e}", path.display()))?;
    let base = path.parent().unwrap_or(Path::new("."));
    manifest.into_book(base).map_err(|e| e.to_string())
}

impl Manifest {
    fn into_book(self, base: &Path) -> folio::Result<Book> {
        let mut book = Book::new();

        if let Some(version) = self.version {
            book.set_version(Version::try_from(version)?);
        }
        if let Some(fix) = self.fix_legacy_markup {
            book.set_fix_legacy_markup(fix);
        }
        if let Some(uuid) = &self.uuid {
            book.set_uuid(uuid)?;
        }
        if let Some(title) = self.title {
            book.set_title(title);
        }
        for author in self.authors {
            book.add_author(author);
        }
        for artist in self.artists {
            book.add_artist(artist);
        }
        for agent in self.creators {
            book.add_creator(agent.name, &agent.role)?;
        }
        for agent in self.contributors {
            book.add_contributor(agent.name, &agent.role)?;
        }
        for language in self.languages {
            book.add_language(language);
        }
        if let Some(publisher) = self.publisher {
            book.add_publisher(publisher);
        }
        if let Some(description) = self.description {
            book.add_description(description);
        }
        for subject in self.subjects {
            book.add_subject(subject);
        }
        if let Some(rights) = self.rights {
            book.add_rights(rights);
        }
        if let Some(date) = self.date {
            book.add_date(date);
        }
        for identifier in self.identifiers {
            book.add_identifier(identifier);
        }
        if let Some(series) = self.series {
            book.set_series(series)?;
        }
        if let Some(set) = self.set {
            book.set_set(set)?;
        }
        if let Some(entry) = &self.entry {
            book.set_entry_number(entry)?;
        }

        for image in self.images {
            let id = book.add_image_file(base.join(&image.source), image.dest.clone())?;
            if self.cover.as_deref() == Some(image.dest.as_str()) {
                book.set_cover_image(&id);
            }
        }
        for css in self.stylesheets {
            book.add_stylesheet_file(base.join(&css.source), css.dest)?;
        }
        for js in self.scripts {
            book.add_script_file(base.join(&js.source), js.dest)?;
        }
        for font in self.fonts {
            book.add_font_file(base.join(&font.source), font.dest)?;
        }
        for doc in self.documents {
            let order = match &doc.order {
                Some(spec) => spec.resolve(&doc.dest)?,
                None => None,
            };
            book.add_xhtml_file(base.join(&doc.source), doc.dest, order)?;
        }

        fn add_children(parent: &mut NavPoint, entries: Vec<TocEntry>) {
            for entry in entries {
                let point = parent.add_navpoint(entry.label, entry.target, entry.order);
                add_children(point, entry.children);
            }
        }
        for entry in self.toc {
            let point = book.add_navpoint(entry.label, entry.target, entry.order);
            add_children(point, entry.children);
        }

        Ok(book)
    }
}

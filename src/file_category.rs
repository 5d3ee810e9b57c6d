/// File categorization by name.
///
/// Maps a file name to a broad category (e.g., "images", "archives") using a
/// static extension table. Classification never touches the filesystem: it is
/// a pure function of the name, so planning stays reproducible.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tidyup::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::standard();
/// assert_eq!(mapper.classify(Path::new("report.PDF")), Some(Category::Document));
/// assert_eq!(mapper.classify(Path::new("backup.tar.lz4")), Some(Category::Archive));
/// assert_eq!(mapper.classify(Path::new("Dockerfile.dev")), Some(Category::Code));
/// assert_eq!(mapper.classify(Path::new("notes")), None);
/// ```
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Multi-segment suffixes that must be matched as a unit.
///
/// Kept sorted longest-first so the first hit is the longest match.
pub const COMPOUND_EXTENSIONS: &[&str] = &[
    ".tar.lzma",
    ".tar.bz2",
    ".tar.lz4",
    ".tar.zst",
    ".tar.gz",
    ".tar.xz",
    ".tbz2",
    ".tgz",
    ".txz",
];

/// Directory suffixes that are macOS document packages rather than folders.
pub const PACKAGE_EXTENSIONS: &[&str] = &[".pages", ".numbers", ".key"];

/// Suffix of macOS application bundles.
pub const APP_EXTENSION: &str = ".app";

/// Build-script names matched exactly (lowercased).
const BUILD_SCRIPT_NAMES: &[&str] = &[
    "makefile",
    "gnumakefile",
    "justfile",
    "rakefile",
    "cmakelists.txt",
];

/// Build-script names matched as a prefix (lowercased), e.g. `Dockerfile.dev`.
const BUILD_SCRIPT_PREFIXES: &[&str] = &["dockerfile"];

/// Represents a broad file category.
///
/// The declaration order is the order categories are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Spreadsheet files (XLSX, CSV, ODS, etc.)
    Spreadsheet,
    /// Code/Source files, configs and build scripts
    Code,
    /// Video files (MP4, MKV, MOV, etc.)
    Video,
    /// Image files (PNG, JPG, HEIC, etc.)
    Image,
    /// Document files (PDF, DOCX, TXT, etc.)
    Document,
    /// Archive files (ZIP, 7Z, TAR.GZ, etc.)
    Archive,
    /// Installer packages and disk images (DMG, PKG, MSI, etc.)
    Installer,
    /// Presentation files (PPTX, KEY, ODP, etc.)
    Presentation,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Font files (TTF, OTF, WOFF, etc.)
    Font,
    /// Bucket for unclassified items
    Other,
}

impl Category {
    /// Every category, in reporting order.
    pub const ALL: [Category; 11] = [
        Category::Spreadsheet,
        Category::Code,
        Category::Video,
        Category::Image,
        Category::Document,
        Category::Archive,
        Category::Installer,
        Category::Presentation,
        Category::Audio,
        Category::Font,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidyup::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "images");
    /// assert_eq!(Category::Installer.dir_name(), "installers");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Spreadsheet => "spreadsheets",
            Category::Code => "code",
            Category::Video => "videos",
            Category::Image => "images",
            Category::Document => "documents",
            Category::Archive => "archives",
            Category::Installer => "installers",
            Category::Presentation => "presentations",
            Category::Audio => "audio",
            Category::Font => "fonts",
            Category::Other => "other",
        }
    }
}

/// Splits a file name into `(stem, extension)`.
///
/// Compound extensions are tried longest-first (case-insensitively) before
/// falling back to the final dot-segment. The extension keeps its original
/// casing and includes the leading dot; a leading dot alone (`.bashrc`)
/// does not start an extension.
///
/// # Examples
///
/// ```
/// use tidyup::file_category::split_base_ext;
///
/// assert_eq!(split_base_ext("backup.TAR.GZ"), ("backup", ".TAR.GZ"));
/// assert_eq!(split_base_ext("photo.jpeg"), ("photo", ".jpeg"));
/// assert_eq!(split_base_ext("README"), ("README", ""));
/// ```
pub fn split_base_ext(name: &str) -> (&str, &str) {
    for ext in COMPOUND_EXTENSIONS {
        if name.len() <= ext.len() {
            continue;
        }
        let start = name.len() - ext.len();
        if let Some(tail) = name.get(start..)
            && tail.eq_ignore_ascii_case(ext)
        {
            return (&name[..start], tail);
        }
    }

    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Returns the lowercased extension token (with leading dot) of a path's file name.
pub fn extension_token(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    split_base_ext(&name).1.to_lowercase()
}

/// Maps file names to categories.
///
/// The standard table is built once and shared read-only; see
/// [`FileMapper::standard`].
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<&'static str, Category>,
}

static STANDARD_MAPPER: LazyLock<FileMapper> = LazyLock::new(FileMapper::new);

impl FileMapper {
    fn new() -> Self {
        let table: &[(Category, &[&'static str])] = &[
            (
                Category::Spreadsheet,
                &[".xls", ".xlsx", ".csv", ".tsv", ".ods", ".numbers"],
            ),
            (
                Category::Code,
                &[
                    ".py", ".ipynb", ".js", ".ts", ".jsx", ".tsx", ".java", ".kt", ".kts", ".go",
                    ".rs", ".rb", ".php", ".c", ".cc", ".cpp", ".h", ".hpp", ".m", ".mm",
                    ".swift", ".cs", ".sh", ".bash", ".zsh", ".fish", ".sql", ".json", ".yaml",
                    ".yml", ".toml", ".ini", ".cfg", ".conf", ".xml", ".gradle", ".pom", ".sln",
                    ".csproj",
                ],
            ),
            (
                Category::Video,
                &[
                    ".mp4", ".mov", ".m4v", ".mkv", ".avi", ".wmv", ".flv", ".webm", ".3gp",
                ],
            ),
            (
                Category::Image,
                &[
                    ".jpg", ".jpeg", ".png", ".gif", ".heic", ".heif", ".webp", ".tif", ".tiff",
                    ".bmp", ".svg", ".ico",
                ],
            ),
            (
                Category::Document,
                &[
                    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".md", ".pages", ".epub", ".mobi",
                    ".odt", ".html", ".htm",
                ],
            ),
            (
                Category::Archive,
                &[
                    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".zst", ".tar.gz",
                    ".tar.bz2", ".tar.xz", ".tar.zst", ".tar.lz4", ".tar.lzma", ".tgz", ".tbz2",
                    ".txz",
                ],
            ),
            (
                Category::Installer,
                &[
                    ".dmg", ".pkg", ".mpkg", ".exe", ".msi", ".deb", ".rpm", ".apk",
                ],
            ),
            (Category::Presentation, &[".ppt", ".pptx", ".key", ".odp"]),
            (
                Category::Audio,
                &[".mp3", ".wav", ".ogg", ".flac", ".aac", ".m4a", ".wma"],
            ),
            (Category::Font, &[".ttf", ".otf", ".woff", ".woff2"]),
        ];

        let extension_map = table
            .iter()
            .flat_map(|(category, exts)| exts.iter().map(move |ext| (*ext, *category)))
            .collect();

        Self { extension_map }
    }

    /// Returns the shared standard mapper.
    pub fn standard() -> &'static FileMapper {
        &STANDARD_MAPPER
    }

    /// Maps an extension token (with or without the leading dot) to a category.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidyup::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::standard();
    /// assert_eq!(mapper.extension_to_category(".pdf"), Some(Category::Document));
    /// assert_eq!(mapper.extension_to_category("PNG"), Some(Category::Image));
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        let ext = ext.to_lowercase();
        if ext.starts_with('.') {
            self.extension_map.get(ext.as_str()).copied()
        } else {
            self.extension_map.get(format!(".{ext}").as_str()).copied()
        }
    }

    /// Classifies a path by its file name.
    ///
    /// Build-script names win over any extension. Otherwise the extension is
    /// extracted compound-first and looked up case-insensitively. Returns
    /// `None` when no category claims the name.
    pub fn classify(&self, path: &Path) -> Option<Category> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();

        if BUILD_SCRIPT_NAMES.contains(&name.as_str())
            || BUILD_SCRIPT_PREFIXES.iter().any(|p| name.starts_with(p))
        {
            return Some(Category::Code);
        }

        let (_, ext) = split_base_ext(&name);
        if ext.is_empty() {
            return None;
        }
        self.extension_map.get(ext).copied()
    }
}

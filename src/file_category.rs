/// File classification by extension.
///
/// This module maps normalized file extensions (uppercase, no leading dot) to
/// a destination folder made of a category and a subtype, e.g. `images/JPG`.
/// Anything the table does not know goes to the flat `other files` folder.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, RoutingTable};
///
/// let table = RoutingTable::default();
/// let route = table.classify("PDF");
/// assert_eq!(route.category, Category::Documents);
/// assert_eq!(route.relative_path(), std::path::PathBuf::from("documents/PDF"));
/// assert_eq!(table.classify("XYZ123").category, Category::Other);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Destination bucket at the top of the organized tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// JPEG, PNG, JPG, SVG
    Images,
    /// AVI, MP4, MOV, MKV
    Video,
    /// DOC, DOCX, TXT, PDF, XLSX, PPTX
    Documents,
    /// MP3, OGG, WAV, AMR
    Audio,
    /// ZIP, GZ, TAR
    Archives,
    /// Everything else, including files without an extension.
    Other,
}

impl Category {
    /// Every category, in the order folders are reported.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Video,
        Category::Documents,
        Category::Audio,
        Category::Archives,
        Category::Other,
    ];

    /// Returns the folder name this category owns directly under the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "images");
    /// assert_eq!(Category::Other.dir_name(), "other files");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Video => "video",
            Category::Documents => "documents",
            Category::Audio => "audio",
            Category::Archives => "archives",
            Category::Other => "other files",
        }
    }

    /// Returns true if `name` is one of the canonical output folder names.
    pub fn is_canonical_dir(name: &str) -> bool {
        Self::ALL.iter().any(|c| c.dir_name() == name)
    }
}

/// Where one file goes: a category folder plus an optional subtype folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub category: Category,
    /// The normalized extension, used as the second folder level.
    /// `None` for the flat `other files` bucket.
    pub subtype: Option<String>,
}

impl Route {
    /// The fallback route.
    pub fn other() -> Self {
        Self {
            category: Category::Other,
            subtype: None,
        }
    }

    /// Path of the target folder relative to the organized root.
    pub fn relative_path(&self) -> PathBuf {
        let base = PathBuf::from(self.category.dir_name());
        match &self.subtype {
            Some(subtype) => base.join(subtype),
            None => base,
        }
    }

    /// Absolute target folder under `root`.
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    /// True when the extension matched a routing rule.
    pub fn is_known(&self) -> bool {
        self.subtype.is_some()
    }
}

/// Normalized extension to category table.
///
/// Built once per run and only read afterwards, so it is shared between
/// workers by reference without locking.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: HashMap<String, Category>,
}

impl RoutingTable {
    /// Creates a table holding the built-in routes.
    pub fn new() -> Self {
        let mut table = Self {
            routes: HashMap::new(),
        };
        table.populate_standard_routes();
        table
    }

    /// Creates the built-in table and layers `extra` on top.
    ///
    /// Keys of `extra` may be given in any case and with or without a
    /// leading dot.
    pub fn with_extra_routes<'a, I>(extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Category)>,
    {
        let mut table = Self::new();
        for (ext, category) in extra {
            table.add_route(ext, *category);
        }
        table
    }

    fn populate_standard_routes(&mut self) {
        for ext in ["JPEG", "PNG", "JPG", "SVG"] {
            self.add_route(ext, Category::Images);
        }
        for ext in ["AVI", "MP4", "MOV", "MKV"] {
            self.add_route(ext, Category::Video);
        }
        for ext in ["DOC", "DOCX", "TXT", "PDF", "XLSX", "PPTX"] {
            self.add_route(ext, Category::Documents);
        }
        for ext in ["MP3", "OGG", "WAV", "AMR"] {
            self.add_route(ext, Category::Audio);
        }
        for ext in ["ZIP", "GZ", "TAR"] {
            self.add_route(ext, Category::Archives);
        }
    }

    fn add_route(&mut self, ext: &str, category: Category) {
        let ext = normalize_extension(ext);
        if !ext.is_empty() {
            self.routes.insert(ext, category);
        }
    }

    /// Routes an already normalized extension.
    ///
    /// The empty extension never hits the table. Misses fall back to
    /// [`Route::other`].
    pub fn classify(&self, extension: &str) -> Route {
        if extension.is_empty() {
            return Route::other();
        }
        match self.routes.get(extension) {
            Some(&Category::Other) => Route::other(),
            Some(&category) => Route {
                category,
                subtype: Some(extension.to_string()),
            },
            None => Route::other(),
        }
    }

    /// True when `extension` has an explicit rule.
    pub fn contains(&self, extension: &str) -> bool {
        self.routes.contains_key(extension)
    }

    /// Number of routed extensions.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Uppercases an extension and strips a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_uppercase()
}

/// Extracts the normalized extension of `path`, or an empty string.
///
/// `.bashrc` style names have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| normalize_extension(&ext.to_string_lossy()))
        .unwrap_or_default()
}

/// The PackURI value type: a part name within an OPC package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path
/// separators. Zip member names are the same string without the leading slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI, rejecting strings without a leading slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        match uri.starts_with('/') {
            true => Ok(Self { uri }),
            false => Err(format!("partname '{}' is not absolute", uri)),
        }
    }

    /// Create a PackURI from a Zip member name such as `ppt/slides/slide1.xml`.
    pub fn from_membername(membername: &str) -> Self {
        PackURI {
            uri: format!("/{}", membername.trim_start_matches('/')),
        }
    }

    /// Resolve a relative reference (like "../media/image1.png") against a base URI
    /// (like "/ppt/slides").
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(Self::normalize_path(relative_ref));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Directory portion, e.g. "/ppt/slides" for "/ppt/slides/slide1.xml".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Filename portion, e.g. "slide1.xml".
    pub fn filename(&self) -> &str {
        self.uri.rfind('/').map_or("", |pos| &self.uri[pos + 1..])
    }

    /// Extension without the leading period, e.g. "xml".
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename.rfind('.').map_or("", |pos| &filename[pos + 1..])
    }

    /// The URI with its leading slash stripped, as stored in the Zip archive.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part.
    ///
    /// "/ppt/media/image1.png" relative to "/ppt/slides" is "../media/image1.png".
    pub fn relative_ref(&self, base_uri: &str) -> String {
        let base: Vec<&str> = segments(base_uri).collect();
        let target: Vec<&str> = segments(&self.uri).collect();
        let shared = base
            .iter()
            .zip(&target)
            .position(|(a, b)| a != b)
            .unwrap_or(base.len().min(target.len()));

        let mut out: Vec<&str> = std::iter::repeat_n("..", base.len() - shared).collect();
        out.extend_from_slice(&target[shared..]);
        out.join("/")
    }

    /// The .rels part for this URI, e.g. "/ppt/slides/_rels/slide1.xml.rels".
    pub fn rels_uri(&self) -> PackURI {
        let dir = self.base_uri().trim_end_matches('/');
        PackURI {
            uri: format!("{}/_rels/{}.rels", dir, self.filename()),
        }
    }

    /// For a .rels part, the URI of the part it describes.
    ///
    /// "/_rels/.rels" maps to the package pseudo-partname "/".
    pub fn rels_source(&self) -> Option<PackURI> {
        let source_name = self.filename().strip_suffix(".rels")?;
        let rels_dir = self.base_uri();
        let dir = rels_dir.strip_suffix("_rels")?;
        let dir = dir.trim_end_matches('/');
        Some(PackURI {
            uri: format!("{}/{}", dir, source_name),
        })
    }

    /// Full URI string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Collapse `.`, `..` and empty segments into an absolute path.
    fn normalize_path(path: &str) -> String {
        let mut kept: Vec<&str> = Vec::new();
        for segment in segments(path) {
            match segment {
                "." => {},
                ".." => {
                    kept.pop();
                },
                _ => kept.push(segment),
            }
        }
        format!("/{}", kept.join("/"))
    }
}

/// Non-empty path segments.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// Pseudo-partname of the package itself, the source of `/_rels/.rels`.
pub const PACKAGE_URI: &str = "/";

/// Member holding the content type registry.
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

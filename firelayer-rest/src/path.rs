//! Resource names and field paths.

use url::Url;

use firelayer_core::error::{DatabaseError, DatabaseResult};

/// Resource name of one Firestore database, `projects/{p}/databases/{d}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePath {
    project_id: String,
    database_id: String,
}

impl DatabasePath {
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    pub fn name(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }

    /// `projects/{p}/databases/{d}/documents`
    pub fn documents(&self) -> String {
        format!("{}/documents", self.name())
    }

    /// Resource name of the document `id` in `collection`.
    ///
    /// `collection` may be a nested path such as `users/u1/posts`.
    pub fn document(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents(), collection.trim_matches('/'), id)
    }

    /// Splits a collection path into the parent resource name and the collection id.
    pub fn collection_parent<'a>(&self, collection: &'a str) -> (String, &'a str) {
        match collection.trim_matches('/').rsplit_once('/') {
            Some((parent, id)) => (format!("{}/{}", self.documents(), parent), id),
            None => (self.documents(), collection.trim_matches('/')),
        }
    }

    /// REST URL of a custom method on the documents root, e.g. `commit` or `batchGet`.
    pub fn documents_method_url(&self, base: &Url, method: &str) -> DatabaseResult<Url> {
        self.url(base, |segments| {
            segments.push(&format!("documents:{method}"));
        })
    }

    /// REST URL of `runQuery` under the parent of `collection`.
    pub fn run_query_url(&self, base: &Url, collection: &str) -> DatabaseResult<Url> {
        let path: Vec<&str> = collection_segments(collection).collect();
        let parent = path.split_last().map(|(_, parent)| parent).unwrap_or_default();

        self.url(base, |segments| match parent.split_last() {
            Some((last, rest)) => {
                segments.push("documents");
                segments.extend(rest);
                segments.push(&format!("{last}:runQuery"));
            }
            None => {
                segments.push("documents:runQuery");
            }
        })
    }

    fn url<F>(&self, base: &Url, append: F) -> DatabaseResult<Url>
    where
        F: FnOnce(&mut url::PathSegmentsMut<'_>),
    {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DatabaseError::Initialization(format!("cannot use {base} as a base URL")))?;
            segments
                .pop_if_empty()
                .extend(["projects", self.project_id.as_str(), "databases", self.database_id.as_str()]);
            append(&mut segments);
        }

        Ok(url)
    }
}

fn collection_segments(collection: &str) -> impl Iterator<Item = &str> {
    collection
        .split('/')
        .filter(|segment| !segment.is_empty())
}

/// Canonical form of a dotted field path.
///
/// Segments that are not plain identifiers are quoted with backticks, as the
/// service requires: `address.zip code` becomes ``address.`zip code` ``.
pub fn canonical_field_path(path: &str) -> String {
    if path == "__name__" {
        return path.to_string();
    }

    path.split('.')
        .map(quote_segment)
        .collect::<Vec<_>>()
        .join(".")
}

fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());

    if simple {
        segment.to_string()
    } else {
        format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

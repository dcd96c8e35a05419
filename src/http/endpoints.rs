//! API endpoint paths
//!
//! Every path is relative to the configured base URL. Path segments and query
//! values are percent-encoded.

use url::form_urlencoded;

const API_BASE: &str = "/api";

/// Percent-encodes one path segment.
fn segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Appends `pairs` to `path` as a query string. Empty pairs leave `path` unchanged.
pub(crate) fn with_query<'a, I>(path: String, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (name, value) in pairs {
        serializer.append_pair(name, &value);
        any = true;
    }

    if any {
        format!("{}?{}", path, serializer.finish())
    } else {
        path
    }
}

fn paging(page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("pageSize", page_size.to_string())]
}

// == Documents ==
pub mod documents {
    use super::*;

    pub fn base() -> String {
        format!("{}/documents", API_BASE)
    }

    /// Paged listing; the API names the page size `size` here.
    pub fn list(page: u32, size: u32) -> String {
        with_query(
            base(),
            [("page", page.to_string()), ("size", size.to_string())],
        )
    }

    pub fn by_id(document_id: &str, include_metadata: bool) -> String {
        let path = format!("{}/{}", base(), segment(document_id));
        if include_metadata {
            with_query(path, [("includeMetadata", "true".to_string())])
        } else {
            path
        }
    }

    /// Upload target with optional storage selection.
    pub fn create(storage: &[(&'static str, &str)]) -> String {
        with_query(base(), storage.iter().map(|(k, v)| (*k, v.to_string())))
    }

    pub fn download(document_id: &str) -> String {
        format!("{}/{}/download", base(), segment(document_id))
    }

    pub fn by_category(category_id: &str, paging_args: Option<(u32, u32)>) -> String {
        let path = format!("{}/category/{}", base(), segment(category_id));
        match paging_args {
            Some((page, page_size)) => with_query(path, paging(page, page_size)),
            None => path,
        }
    }

    pub fn versions(document_id: &str) -> String {
        format!("{}/{}/versions", base(), segment(document_id))
    }
}

// == Categories ==
pub mod categories {
    use super::*;

    pub fn base() -> String {
        format!("{}/categories", API_BASE)
    }

    pub fn all() -> String {
        format!("{}/all", base())
    }

    pub fn root() -> String {
        format!("{}/root", base())
    }

    pub fn by_id(category_id: &str) -> String {
        format!("{}/{}", base(), segment(category_id))
    }

    pub fn subcategories(category_id: &str) -> String {
        format!("{}/{}/subcategories", base(), segment(category_id))
    }

    pub fn paged(page: u32, page_size: u32, search_term: Option<&str>) -> String {
        let mut query = paging(page, page_size);
        if let Some(term) = search_term.filter(|t| !t.is_empty()) {
            query.push(("searchTerm", term.to_string()));
        }
        with_query(base(), query)
    }
}

// == Metadata ==
pub mod metadata {
    use super::*;

    pub fn base() -> String {
        format!("{}/metadata", API_BASE)
    }

    /// Read, create and update share one path.
    pub fn document(document_id: &str) -> String {
        format!("{}/document/{}", base(), segment(document_id))
    }

    /// Search with JSON-encoded criteria.
    pub fn search(criteria_json: &str, paging_args: Option<(u32, u32)>) -> String {
        let mut query = vec![("searchCriteriaJson", criteria_json.to_string())];
        if let Some((page, page_size)) = paging_args {
            query.extend(paging(page, page_size));
        }
        with_query(format!("{}/search", base()), query)
    }

    pub fn tags() -> String {
        format!("{}/tags", base())
    }

    pub fn tags_paged(page: u32, page_size: u32) -> String {
        with_query(tags(), paging(page, page_size))
    }

    pub fn validate(schema_name: &str) -> String {
        with_query(
            format!("{}/validate", base()),
            [("schemaName", schema_name.to_string())],
        )
    }

    pub fn schemas() -> String {
        format!("{}/schemas", base())
    }

    pub fn schemas_paged(page: u32, page_size: u32, query: Option<&str>) -> String {
        let mut pairs = paging(page, page_size);
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            pairs.push(("query", q.to_string()));
        }
        with_query(schemas(), pairs)
    }

    pub fn schema_by_id(schema_id: &str) -> String {
        format!("{}/{}", schemas(), segment(schema_id))
    }
}

// == Storage ==
pub mod storage {
    use super::*;

    pub fn accessible_buckets(page: u32, page_size: u32) -> String {
        with_query(
            format!("{}/storage/buckets/my-accessible-buckets", API_BASE),
            paging(page, page_size),
        )
    }

    pub fn accessible_providers() -> String {
        format!("{}/storage/providers/user-accessible", API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_paths() {
        assert_eq!(documents::list(1, 10), "/api/documents?page=1&size=10");
        assert_eq!(documents::by_id("d1", false), "/api/documents/d1");
        assert_eq!(
            documents::by_id("d1", true),
            "/api/documents/d1?includeMetadata=true"
        );
        assert_eq!(documents::download("d1"), "/api/documents/d1/download");
        assert_eq!(documents::by_category("c1", None), "/api/documents/category/c1");
        assert_eq!(
            documents::by_category("c1", Some((2, 5))),
            "/api/documents/category/c1?page=2&pageSize=5"
        );
        assert_eq!(documents::create(&[]), "/api/documents");
        assert_eq!(
            documents::create(&[("bucketId", "b1")]),
            "/api/documents?bucketId=b1"
        );
    }

    #[test]
    fn test_category_paths() {
        assert_eq!(categories::all(), "/api/categories/all");
        assert_eq!(categories::root(), "/api/categories/root");
        assert_eq!(
            categories::subcategories("c1"),
            "/api/categories/c1/subcategories"
        );
        assert_eq!(
            categories::paged(1, 10, None),
            "/api/categories?page=1&pageSize=10"
        );
        assert_eq!(
            categories::paged(1, 10, Some("")),
            "/api/categories?page=1&pageSize=10"
        );
        assert_eq!(
            categories::paged(3, 20, Some("tax & legal")),
            "/api/categories?page=3&pageSize=20&searchTerm=tax+%26+legal"
        );
    }

    #[test]
    fn test_metadata_paths() {
        assert_eq!(metadata::document("d1"), "/api/metadata/document/d1");
        assert_eq!(metadata::tags_paged(1, 10), "/api/metadata/tags?page=1&pageSize=10");
        assert_eq!(
            metadata::search(r#"{"query":"x"}"#, None),
            "/api/metadata/search?searchCriteriaJson=%7B%22query%22%3A%22x%22%7D"
        );
        assert!(metadata::search("{}", Some((2, 5))).ends_with("&page=2&pageSize=5"));
        assert_eq!(
            metadata::validate("invoice"),
            "/api/metadata/validate?schemaName=invoice"
        );
        assert_eq!(
            metadata::schemas_paged(1, 10, Some("inv")),
            "/api/metadata/schemas?page=1&pageSize=10&query=inv"
        );
        assert_eq!(metadata::schema_by_id("s1"), "/api/metadata/schemas/s1");
    }

    #[test]
    fn test_storage_paths() {
        assert_eq!(
            storage::accessible_buckets(1, 20),
            "/api/storage/buckets/my-accessible-buckets?page=1&pageSize=20"
        );
        assert_eq!(
            storage::accessible_providers(),
            "/api/storage/providers/user-accessible"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(categories::by_id("a/b"), "/api/categories/a%2Fb");
    }
}

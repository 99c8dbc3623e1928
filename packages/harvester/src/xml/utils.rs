//! XML utility functions for navigating and extracting data from DOM trees.
//!
//! LeyChile documents declare a default namespace; every lookup here
//! compares local names only, so callers never deal with namespaces.

use roxmltree::Node;

use crate::text::fold_accents;

/// Get the tag name without namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use leychile_harvester::xml::get_tag_name;
///
/// let xml = r#"<Norma xmlns="http://www.leychile.cl/esquemas"><Texto/></Norma>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "Norma");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given local name.
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find a descendant element matching a slash-separated path of local names.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use leychile_harvester::xml::find_by_path;
///
/// let xml = r#"<Norma><Identificadores><Numero>21595</Numero></Identificadores></Norma>"#;
/// let doc = Document::parse(xml).unwrap();
/// let numero = find_by_path(doc.root_element(), "Identificadores/Numero").unwrap();
/// assert_eq!(numero.text(), Some("21595"));
/// ```
pub fn find_by_path<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    path.split('/')
        .try_fold(node, |current, part| find_child(current, part))
}

/// All text below a node, in document order, untrimmed.
///
/// `Texto` elements occasionally wrap runs in inline markup; this keeps
/// the words those elements carry.
pub fn element_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Text at a path below `node`, trimmed; `None` when missing or blank.
pub fn text_at(node: Node<'_, '_>, path: &str) -> Option<String> {
    find_by_path(node, path)
        .map(element_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Attribute lookup ignoring the case of the attribute name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use leychile_harvester::xml::attribute_ci;
///
/// let doc = Document::parse(r#"<E TipoParte="Artículo"/>"#).unwrap();
/// assert_eq!(attribute_ci(doc.root_element(), "tipoParte"), Some("Artículo"));
/// ```
pub fn attribute_ci<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name().eq_ignore_ascii_case(name))
        .map(|attr| attr.value())
}

/// Whether the local tag name folds (case and accents) to `folded`.
pub fn has_folded_tag(node: Node<'_, '_>, folded: &str) -> bool {
    node.is_element() && fold_accents(get_tag_name(node)) == folded
}

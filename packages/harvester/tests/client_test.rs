//! Tests for the LeyChile client against a mock upstream.

use std::fs;
use std::path::Path;

use leychile_harvester::client::{DocumentSource, LeyChileClient};
use leychile_harvester::config::SourceConfig;
use leychile_harvester::{download_law, global_search, HarvesterError};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Run `f` with a client pointed at `server`, off the async runtime.
///
/// The blocking client must be built and dropped outside async contexts.
async fn with_client<T, F>(server: &MockServer, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&LeyChileClient) -> T + Send + 'static,
{
    let base_url = server.uri();
    tokio::task::spawn_blocking(move || {
        let client = LeyChileClient::with_config(SourceConfig::single(base_url)).unwrap();
        f(&client)
    })
    .await
    .unwrap()
}

async fn mount_navigate(server: &MockServer, law_number: &str, id_norma: &str) {
    let page = format!(
        r#"<html><body><a href="/Navegar?idNorma={id_norma}&amp;idVersion=2023-08-17">Ley</a></body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/Navegar"))
        .and(query_param("idLey", law_number))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
}

async fn mount_law_xml(server: &MockServer, id_norma: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/Consulta/obtxml"))
        .and(query_param("opt", "7"))
        .and(query_param("idNorma", id_norma))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_law_end_to_end() {
    let server = MockServer::start().await;
    mount_navigate(&server, "21595", "1195119").await;
    mount_law_xml(&server, "1195119", load_fixture("ley_21595.xml")).await;

    let law = with_client(&server, |client| download_law(client, "21.595"))
        .await
        .unwrap();

    assert_eq!(law.law_number, "21595");
    assert_eq!(law.id_norma, "1195119");
    assert_eq!(law.articles.len(), 5);
    assert_eq!(law.articles[1].canonical_id, "1bis");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_navigation_page_without_id_norma() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Navegar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sin resultados</html>"))
        .mount(&server)
        .await;

    let result = with_client(&server, |client| client.resolve_id_norma("99999")).await;

    assert!(matches!(result, Err(HarvesterError::NormaNotFound(n)) if n == "99999"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Consulta/obtxml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = with_client(&server, |client| client.fetch_law_xml("1195119")).await;

    assert!(matches!(result, Err(HarvesterError::Download { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Consulta/obtxml"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = with_client(&server, |client| client.fetch_law_xml("1195119")).await;

    assert!(matches!(
        result,
        Err(HarvesterError::RetriesExhausted { attempts: 3, .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_html_fragment() {
    let server = MockServer::start().await;
    let page = r#"<html><body>
        <div class="textoNorma" id="p10449614">
          <p>Artículo 1.-</p>
          <p>Para los efectos de esta ley...</p>
        </div>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/leychile/navegar"))
        .and(query_param("idNorma", "1195119"))
        .and(query_param("idParte", "10449614"))
        .and(header("user-agent", leychile_harvester::http::BROWSER_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let fragment = with_client(&server, |client| {
        client.fetch_html_fragment("1195119", "10449614")
    })
    .await
    .unwrap();

    assert_eq!(fragment.selector, "[id='p10449614']");
    assert_eq!(fragment.text, "Artículo 1.-\nPara los efectos de esta ley...");
    assert!(fragment.source_url.ends_with("idNorma=1195119&idParte=10449614"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_html_fragment_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/leychile/navegar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    let result =
        with_client(&server, |client| client.fetch_html_fragment("1195119", "1")).await;

    assert!(matches!(
        result,
        Err(HarvesterError::HtmlFragmentNotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_global_search_skips_unavailable_laws() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Consulta/obtxml"))
        .and(query_param("opt", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(load_fixture("ultimas_leyes.xml")))
        .mount(&server)
        .await;
    mount_law_xml(&server, "1195119", load_fixture("ley_21595.xml")).await;
    // Ley 21.600 has no idNorma in the listing and its navigation page is missing.
    Mock::given(method("GET"))
        .and(path("/Navegar"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let hits = with_client(&server, |client| {
        global_search(client, "delito económico", 10, 10)
    })
    .await
    .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].law_number, "21595");
    assert_eq!(hits[0].canonical_id, "1bis");
    assert_eq!(hits[0].source_part_id.as_deref(), Some("10449615"));
}

use std::sync::Arc;
use std::time::Duration;

use mockall::predicate::eq;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use crate::config::PipelineConfig;
use crate::entities::{EmailSource, EmailStatus, Target};
use crate::fetcher::render::{MockRenderFetcher, RenderError, RenderFetcher};
use crate::pipeline::EmailPipeline;

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        first_backoff: Duration::from_millis(10),
        later_backoff: Duration::from_millis(10),
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(2),
        ..PipelineConfig::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{body}</body></html>"))
        .insert_header("Content-Type", "text/html; charset=utf-8")
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn pipeline_with(renderer: MockRenderFetcher) -> EmailPipeline {
    let renderer: Arc<dyn RenderFetcher> = Arc::new(renderer);
    EmailPipeline::new(fast_config(), Some(renderer)).unwrap()
}

#[tokio::test]
async fn test_renderer_not_called_when_homepage_has_email() {
    let server = MockServer::start().await;
    serve(&server, "/", r#"<a href="mailto:info@testbiz.com">Email</a>"#).await;

    let mut renderer = MockRenderFetcher::new();
    renderer.expect_render().never();

    let mut target = Target::new(server.uri());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.email_source, Some(EmailSource::Homepage));
}

#[tokio::test]
async fn test_website_error_skips_later_levels() {
    let mut renderer = MockRenderFetcher::new();
    renderer.expect_render().never();

    let mut target = Target::new("http://127.0.0.1:1");
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.email_status, EmailStatus::WebsiteError);
    assert!(target.emails.is_empty());
    assert_eq!(target.email_source, None);
}

#[tokio::test]
async fn test_browser_homepage() {
    let server = MockServer::start().await;
    serve(&server, "/", "<div id=\"app\"></div>").await;
    let homepage = format!("{}/", server.uri());

    let mut renderer = MockRenderFetcher::new();
    renderer
        .expect_render()
        .with(eq(homepage.clone()))
        .times(1)
        .returning(|_| Ok(r#"<div id="app"><p>Mail owner@spa-bistro.com</p></div>"#.to_string()));

    let mut target = Target::new(server.uri());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.emails, vec!["owner@spa-bistro.com"]);
    assert_eq!(target.email_status, EmailStatus::Found);
    assert_eq!(target.email_source, Some(EmailSource::BrowserHomepage));
}

#[tokio::test]
async fn test_browser_contact_page_uses_static_discovery() {
    let server = MockServer::start().await;
    serve(&server, "/", r#"<a href="/contact">Contact</a><a href="/about">About</a>"#).await;
    serve(&server, "/contact", "<div id=\"form\"></div>").await;
    serve(&server, "/about", "<p>Founded 1999</p>").await;
    let base = server.uri();

    let mut renderer = MockRenderFetcher::new();
    renderer
        .expect_render()
        .with(eq(format!("{base}/")))
        .times(1)
        .returning(|_| Ok("<div id=\"app\"></div>".to_string()));
    renderer
        .expect_render()
        .with(eq(format!("{base}/contact")))
        .times(1)
        .returning(|_| Err(RenderError::Request("navigation timeout".to_string())));
    renderer
        .expect_render()
        .with(eq(format!("{base}/about")))
        .times(1)
        .returning(|_| Ok(r#"<a href="mailto:team@spa-bistro.com">Team</a>"#.to_string()));

    let mut target = Target::new(base.clone());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.emails, vec!["team@spa-bistro.com"]);
    assert_eq!(target.email_source, Some(EmailSource::BrowserContactPage));
}

#[tokio::test]
async fn test_browser_rediscovers_contact_pages_on_rendered_homepage() {
    let server = MockServer::start().await;
    // Static homepage is an empty shell without links.
    serve(&server, "/", "<div id=\"root\"></div>").await;
    let base = server.uri();

    let mut renderer = MockRenderFetcher::new();
    renderer
        .expect_render()
        .with(eq(format!("{base}/")))
        .times(1)
        .returning(|_| Ok(r#"<nav><a href="/kontakt">Kontakt</a></nav>"#.to_string()));
    renderer
        .expect_render()
        .with(eq(format!("{base}/kontakt")))
        .times(1)
        .returning(|_| Ok("<p>E-Mail: buero@handwerk-meier.de</p>".to_string()));

    let mut target = Target::new(base.clone());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.emails, vec!["buero@handwerk-meier.de"]);
    assert_eq!(target.email_source, Some(EmailSource::BrowserContactPage));
}

#[tokio::test]
async fn test_browser_renders_at_most_three_contact_pages() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<a href="/contact">Contact</a>
           <a href="/contatti">Contatti</a>
           <a href="/kontakt">Kontakt</a>
           <a href="/contacto">Contacto</a>
           <a href="/about">About</a>"#,
    )
    .await;
    for page in ["/contact", "/contatti", "/kontakt", "/contacto", "/about"] {
        serve(&server, page, "<p>Nothing here</p>").await;
    }

    let mut renderer = MockRenderFetcher::new();
    renderer
        .expect_render()
        .times(4)
        .returning(|_| Ok("<p>Still nothing</p>".to_string()));

    let mut target = Target::new(server.uri());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.email_status, EmailStatus::NotFound);
    assert!(target.emails.is_empty());
}

#[tokio::test]
async fn test_empty_render_is_skipped() {
    let server = MockServer::start().await;
    serve(&server, "/", "<p>Welcome</p>").await;

    let mut renderer = MockRenderFetcher::new();
    renderer
        .expect_render()
        .times(1)
        .returning(|_| Ok("   ".to_string()));

    let mut target = Target::new(server.uri());
    pipeline_with(renderer).run(&mut target).await.unwrap();

    assert_eq!(target.email_status, EmailStatus::NotFound);
}
